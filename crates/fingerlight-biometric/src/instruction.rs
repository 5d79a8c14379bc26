//! Instruction codes and confirmation-code mapping.
//!
//! Every acknowledgement starts with a confirmation code. Each operation
//! accepts a handful of codes; anything else is folded into that operation's
//! communication-error outcome so callers only ever see the closed status
//! enums from `fingerlight_hardware::traits`.

use fingerlight_hardware::traits::{
    CaptureStatus, ExtractStatus, ModelStatus, SearchOutcome, StoreStatus,
};

/// Instruction byte, first byte of a command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instruction {
    /// Capture a finger image.
    GenImg = 0x01,
    /// Convert the image into a character buffer.
    Img2Tz = 0x02,
    /// Search the library with a character buffer.
    Search = 0x04,
    /// Merge both character buffers into a model.
    RegModel = 0x05,
    /// Store a model at a page id.
    Store = 0x06,
    /// Read the system parameter block.
    ReadSysPara = 0x0F,
    /// Verify the module password.
    VfyPwd = 0x13,
    /// Number of stored templates.
    TemplateNum = 0x1D,
}

impl Instruction {
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Confirmation codes reported in acknowledgements.
pub mod confirm {
    pub const OK: u8 = 0x00;
    pub const PACKET_RECEIVE_ERR: u8 = 0x01;
    pub const NO_FINGER: u8 = 0x02;
    pub const IMAGE_FAIL: u8 = 0x03;
    pub const IMAGE_MESSY: u8 = 0x06;
    pub const FEATURE_FAIL: u8 = 0x07;
    pub const NOT_FOUND: u8 = 0x09;
    pub const ENROLL_MISMATCH: u8 = 0x0A;
    pub const BAD_LOCATION: u8 = 0x0B;
    pub const WRONG_PASSWORD: u8 = 0x13;
    pub const INVALID_IMAGE: u8 = 0x15;
    pub const FLASH_ERR: u8 = 0x18;
}

pub fn capture_status(code: u8) -> CaptureStatus {
    match code {
        confirm::OK => CaptureStatus::Ok,
        confirm::NO_FINGER => CaptureStatus::NoFinger,
        confirm::IMAGE_FAIL => CaptureStatus::ImagingError,
        _ => CaptureStatus::CommError,
    }
}

pub fn extract_status(code: u8) -> ExtractStatus {
    match code {
        confirm::OK => ExtractStatus::Ok,
        confirm::IMAGE_MESSY => ExtractStatus::TooMessy,
        confirm::FEATURE_FAIL => ExtractStatus::FeatureFail,
        confirm::INVALID_IMAGE => ExtractStatus::InvalidImage,
        _ => ExtractStatus::CommError,
    }
}

/// Map a search reply. `id` and `confidence` are only meaningful on `OK`.
pub fn search_outcome(code: u8, id: u16, confidence: u16) -> SearchOutcome {
    match code {
        confirm::OK => SearchOutcome::Found { id, confidence },
        confirm::NOT_FOUND => SearchOutcome::NotFound,
        _ => SearchOutcome::CommError,
    }
}

pub fn model_status(code: u8) -> ModelStatus {
    match code {
        confirm::OK => ModelStatus::Ok,
        confirm::ENROLL_MISMATCH => ModelStatus::Mismatch,
        _ => ModelStatus::CommError,
    }
}

pub fn store_status(code: u8) -> StoreStatus {
    match code {
        confirm::OK => StoreStatus::Ok,
        confirm::BAD_LOCATION => StoreStatus::BadLocation,
        confirm::FLASH_ERR => StoreStatus::FlashError,
        _ => StoreStatus::CommError,
    }
}

/// Decode the packet-size code of the parameter block into bytes.
pub fn packet_length_from_code(code: u16) -> u16 {
    32 << code.min(3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0x00, CaptureStatus::Ok)]
    #[case(0x01, CaptureStatus::CommError)]
    #[case(0x02, CaptureStatus::NoFinger)]
    #[case(0x03, CaptureStatus::ImagingError)]
    #[case(0x18, CaptureStatus::CommError)]
    fn test_capture_status(#[case] code: u8, #[case] expected: CaptureStatus) {
        assert_eq!(capture_status(code), expected);
    }

    #[rstest]
    #[case(0x00, ExtractStatus::Ok)]
    #[case(0x06, ExtractStatus::TooMessy)]
    #[case(0x07, ExtractStatus::FeatureFail)]
    #[case(0x15, ExtractStatus::InvalidImage)]
    #[case(0x01, ExtractStatus::CommError)]
    #[case(0xFF, ExtractStatus::CommError)]
    fn test_extract_status(#[case] code: u8, #[case] expected: ExtractStatus) {
        assert_eq!(extract_status(code), expected);
    }

    #[rstest]
    #[case(0x00, SearchOutcome::Found { id: 4, confidence: 88 })]
    #[case(0x09, SearchOutcome::NotFound)]
    #[case(0x01, SearchOutcome::CommError)]
    fn test_search_outcome(#[case] code: u8, #[case] expected: SearchOutcome) {
        assert_eq!(search_outcome(code, 4, 88), expected);
    }

    #[rstest]
    #[case(0x00, ModelStatus::Ok)]
    #[case(0x0A, ModelStatus::Mismatch)]
    #[case(0x01, ModelStatus::CommError)]
    fn test_model_status(#[case] code: u8, #[case] expected: ModelStatus) {
        assert_eq!(model_status(code), expected);
    }

    #[rstest]
    #[case(0x00, StoreStatus::Ok)]
    #[case(0x0B, StoreStatus::BadLocation)]
    #[case(0x18, StoreStatus::FlashError)]
    #[case(0x01, StoreStatus::CommError)]
    fn test_store_status(#[case] code: u8, #[case] expected: StoreStatus) {
        assert_eq!(store_status(code), expected);
    }

    #[rstest]
    #[case(0, 32)]
    #[case(1, 64)]
    #[case(2, 128)]
    #[case(3, 256)]
    fn test_packet_length_from_code(#[case] code: u16, #[case] bytes: u16) {
        assert_eq!(packet_length_from_code(code), bytes);
    }
}
