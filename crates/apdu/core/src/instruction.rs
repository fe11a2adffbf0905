//! ISO/IEC 7816-4 instruction codes
//!
//! Odd instruction codes denote the BER-TLV encoded variant of the even one.

use std::fmt;

/// Largest command data field of a short APDU
pub const MAX_LEN_CMD_DATA_STANDARD: usize = 255;
/// Largest response data field of a short APDU
pub const MAX_LEN_RESP_DATA_STANDARD: usize = 256;
/// Largest command data field of an extended APDU
pub const MAX_LEN_CMD_DATA_EXTENDED: usize = 65_535;
/// Largest response data field of an extended APDU
pub const MAX_LEN_RESP_DATA_EXTENDED: usize = 65_536;

macro_rules! instructions {
    ($($(#[$doc:meta])* $name:ident = $code:literal, $label:literal;)+) => {
        /// Interindustry instruction byte
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum Instruction {
            $($(#[$doc])* $name = $code,)+
        }

        impl Instruction {
            /// Every instruction in code order
            pub const ALL: &'static [Self] = &[$(Self::$name,)+];

            /// Human readable command name
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => $label,)+
                }
            }

            /// Look up an instruction by code
            pub const fn from_code(code: u8) -> Option<Self> {
                match code {
                    $($code => Some(Self::$name),)+
                    _ => None,
                }
            }
        }
    };
}

instructions! {
    /// DEACTIVATE FILE
    DeactivateFile = 0x04, "DEACTIVATE FILE";
    /// ERASE RECORD(S)
    EraseRecord = 0x0C, "ERASE RECORD";
    /// ERASE BINARY
    EraseBinary = 0x0E, "ERASE BINARY";
    /// ERASE BINARY, odd form
    EraseBinaryOdd = 0x0F, "ERASE BINARY";
    /// PERFORM SCQL OPERATION
    PerformScqlOperation = 0x10, "PERFORM SCQL OPERATION";
    /// PERFORM TRANSACTION OPERATION
    PerformTransactionOperation = 0x12, "PERFORM TRANSACTION OPERATION";
    /// PERFORM USER OPERATION
    PerformUserOperation = 0x14, "PERFORM USER OPERATION";
    /// VERIFY
    Verify = 0x20, "VERIFY";
    /// VERIFY, odd form
    VerifyOdd = 0x21, "VERIFY";
    /// MANAGE SECURITY ENVIRONMENT
    ManageSecurityEnvironment = 0x22, "MANAGE SECURITY ENVIRONMENT";
    /// CHANGE REFERENCE DATA
    ChangeReferenceData = 0x24, "CHANGE REFERENCE DATA";
    /// DISABLE VERIFICATION REQUIREMENT
    DisableVerificationRequirement = 0x26, "DISABLE VERIFICATION REQUIREMENT";
    /// ENABLE VERIFICATION REQUIREMENT
    EnableVerificationRequirement = 0x28, "ENABLE VERIFICATION REQUIREMENT";
    /// PERFORM SECURITY OPERATION
    PerformSecurityOperation = 0x2A, "PERFORM SECURITY OPERATION";
    /// RESET RETRY COUNTER
    ResetRetryCounter = 0x2C, "RESET RETRY COUNTER";
    /// ACTIVATE FILE
    ActivateFile = 0x44, "ACTIVATE FILE";
    /// GENERATE ASYMMETRIC KEY PAIR
    GenerateAsymmetricKeyPair = 0x46, "GENERATE ASYMMETRIC KEY PAIR";
    /// MANAGE CHANNEL
    ManageChannel = 0x70, "MANAGE CHANNEL";
    /// EXTERNAL (/ MUTUAL) AUTHENTICATE
    ExternalOrMutualAuthenticate = 0x82, "EXTERNAL AUTHENTICATE";
    /// GET CHALLENGE
    GetChallenge = 0x84, "GET CHALLENGE";
    /// GENERAL AUTHENTICATE
    GeneralAuthenticate = 0x87, "GENERAL AUTHENTICATE";
    /// INTERNAL AUTHENTICATE
    InternalAuthenticate = 0x88, "INTERNAL AUTHENTICATE";
    /// SEARCH BINARY
    SearchBinary = 0xA0, "SEARCH BINARY";
    /// SEARCH BINARY, odd form
    SearchBinaryOdd = 0xA1, "SEARCH BINARY";
    /// SEARCH RECORD
    SearchRecord = 0xA2, "SEARCH RECORD";
    /// SELECT
    Select = 0xA4, "SELECT";
    /// READ BINARY
    ReadBinary = 0xB0, "READ BINARY";
    /// READ BINARY, odd form
    ReadBinaryOdd = 0xB1, "READ BINARY";
    /// READ RECORD(S)
    ReadRecord = 0xB2, "READ RECORD";
    /// READ RECORD(S), odd form
    ReadRecordOdd = 0xB3, "READ RECORD";
    /// GET RESPONSE
    GetResponse = 0xC0, "GET RESPONSE";
    /// ENVELOPE
    Envelope = 0xC2, "ENVELOPE";
    /// ENVELOPE, odd form
    EnvelopeOdd = 0xC3, "ENVELOPE";
    /// GET DATA
    GetData = 0xCA, "GET DATA";
    /// GET DATA, odd form
    GetDataOdd = 0xCB, "GET DATA";
    /// WRITE BINARY
    WriteBinary = 0xD0, "WRITE BINARY";
    /// WRITE BINARY, odd form
    WriteBinaryOdd = 0xD1, "WRITE BINARY";
    /// WRITE RECORD
    WriteRecord = 0xD2, "WRITE RECORD";
    /// UPDATE BINARY
    UpdateBinary = 0xD6, "UPDATE BINARY";
    /// UPDATE BINARY, odd form
    UpdateBinaryOdd = 0xD7, "UPDATE BINARY";
    /// PUT DATA
    PutData = 0xDA, "PUT DATA";
    /// PUT DATA, odd form
    PutDataOdd = 0xDB, "PUT DATA";
    /// UPDATE RECORD
    UpdateRecord = 0xDC, "UPDATE RECORD";
    /// UPDATE RECORD, odd form
    UpdateRecordOdd = 0xDD, "UPDATE RECORD";
    /// CREATE FILE
    CreateFile = 0xE0, "CREATE FILE";
    /// APPEND RECORD
    AppendRecord = 0xE2, "APPEND RECORD";
    /// DELETE FILE
    DeleteFile = 0xE4, "DELETE FILE";
    /// TERMINATE DF
    TerminateDf = 0xE6, "TERMINATE DF";
    /// TERMINATE EF
    TerminateEf = 0xE8, "TERMINATE EF";
    /// TERMINATE CARD USAGE
    TerminateCardUsage = 0xFE, "TERMINATE CARD USAGE";
}

impl Instruction {
    /// Instruction byte
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Whether this is the odd, BER-TLV data field variant
    pub const fn is_odd(self) -> bool {
        self.code() & 0x01 == 0x01
    }
}

impl TryFrom<u8> for Instruction {
    type Error = u8;

    fn try_from(code: u8) -> Result<Self, u8> {
        Self::from_code(code).ok_or(code)
    }
}

impl From<Instruction> for u8 {
    fn from(ins: Instruction) -> Self {
        ins.code()
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
