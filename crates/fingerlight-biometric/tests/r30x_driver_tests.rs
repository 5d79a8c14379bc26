mod common;

use common::{ADDRESS, ScriptedLink, sys_para_reply};
use fingerlight_biometric::{PacketKind, R30xSensor};
use fingerlight_hardware::{
    CaptureStatus, ExtractStatus, FeatureSlot, FingerprintSensor, HardwareError, ModelStatus,
    SearchOutcome, StoreStatus,
};
use rstest::rstest;

fn sensor(link: &ScriptedLink) -> R30xSensor<ScriptedLink> {
    R30xSensor::new(link.clone(), ADDRESS, 0)
}

#[tokio::test]
async fn test_handshake_verifies_password() {
    let link = ScriptedLink::new();
    link.reply(&[0x00]);
    let mut sensor = R30xSensor::new(link.clone(), ADDRESS, 0x0102_0304);

    assert!(sensor.initialize(57_600).await.unwrap());
    assert_eq!(link.baud_rate(), Some(57_600));

    let commands = link.commands();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].kind, PacketKind::Command);
    assert_eq!(commands[0].payload.as_ref(), &[0x13, 0x01, 0x02, 0x03, 0x04]);
}

#[rstest]
#[case::wrong_password(0x13)]
#[case::receive_error(0x01)]
#[tokio::test]
async fn test_handshake_rejected(#[case] code: u8) {
    let link = ScriptedLink::new();
    link.reply(&[code]);
    assert!(!sensor(&link).initialize(57_600).await.unwrap());
}

#[tokio::test]
async fn test_silent_module_is_an_error() {
    let link = ScriptedLink::new();
    let err = sensor(&link).initialize(57_600).await.unwrap_err();
    assert!(matches!(err, HardwareError::CommunicationError { .. }));
}

#[rstest]
#[case(0)]
#[case(56_000)]
#[case(230_400)]
#[tokio::test]
async fn test_unsupported_baud_rate(#[case] baud_rate: u32) {
    let link = ScriptedLink::new();
    let err = sensor(&link).initialize(baud_rate).await.unwrap_err();
    assert!(matches!(err, HardwareError::Unsupported { .. }));
    assert!(link.commands().is_empty());
    assert_eq!(link.baud_rate(), None);
}

#[tokio::test]
async fn test_read_parameters() {
    let link = ScriptedLink::new();
    link.reply(&sys_para_reply());

    let params = sensor(&link).parameters().await.unwrap();
    assert_eq!(params.status_register, 0x0004);
    assert_eq!(params.system_id, 0x0009);
    assert_eq!(params.capacity, 163);
    assert_eq!(params.security_level, 5);
    assert_eq!(params.device_address, 0xFFFF_FFFF);
    assert_eq!(params.packet_length, 256);
    assert_eq!(params.baud_rate, 57_600);
}

#[tokio::test]
async fn test_template_count() {
    let link = ScriptedLink::new();
    link.reply(&[0x00, 0x00, 0x07]);
    assert_eq!(sensor(&link).template_count().await.unwrap(), 7);
}

#[tokio::test]
async fn test_short_template_count_reply_is_invalid_data() {
    let link = ScriptedLink::new();
    link.reply(&[0x00, 0x07]);
    let err = sensor(&link).template_count().await.unwrap_err();
    assert!(matches!(err, HardwareError::InvalidData { .. }));
}

#[rstest]
#[case(0x00, CaptureStatus::Ok)]
#[case(0x02, CaptureStatus::NoFinger)]
#[case(0x03, CaptureStatus::ImagingError)]
#[case(0x01, CaptureStatus::CommError)]
#[tokio::test]
async fn test_capture_image(#[case] code: u8, #[case] expected: CaptureStatus) {
    let link = ScriptedLink::new();
    link.reply(&[code]);
    assert_eq!(sensor(&link).capture_image().await.unwrap(), expected);
    assert_eq!(link.commands()[0].payload.as_ref(), &[0x01]);
}

#[tokio::test]
async fn test_extract_into_second_buffer() {
    let link = ScriptedLink::new();
    link.reply(&[0x06]);

    let status = sensor(&link)
        .extract_features(FeatureSlot::Two)
        .await
        .unwrap();
    assert_eq!(status, ExtractStatus::TooMessy);
    assert_eq!(link.commands()[0].payload.as_ref(), &[0x02, 0x02]);
}

#[tokio::test]
async fn test_search_reads_capacity_once() {
    let link = ScriptedLink::new();
    link.reply(&sys_para_reply());
    link.reply(&[0x00, 0x00, 0x03, 0x00, 0x78]);
    link.reply(&[0x09, 0x00, 0x00, 0x00, 0x00]);
    let mut sensor = sensor(&link);

    assert_eq!(
        sensor.search().await.unwrap(),
        SearchOutcome::Found {
            id: 3,
            confidence: 120
        }
    );
    assert_eq!(sensor.search().await.unwrap(), SearchOutcome::NotFound);

    let commands = link.commands();
    assert_eq!(commands.len(), 3);
    assert_eq!(commands[0].payload.as_ref(), &[0x0F]);
    assert_eq!(commands[1].payload.as_ref(), &[0x04, 0x01, 0x00, 0x00, 0x00, 0xA3]);
    assert_eq!(commands[2].payload.as_ref(), &[0x04, 0x01, 0x00, 0x00, 0x00, 0xA3]);
}

#[tokio::test]
async fn test_enroll_commands() {
    let link = ScriptedLink::new();
    link.reply(&[0x00]);
    link.reply(&[0x18]);
    let mut sensor = sensor(&link);

    assert_eq!(sensor.create_model().await.unwrap(), ModelStatus::Ok);
    assert_eq!(sensor.store_model(0x0105).await.unwrap(), StoreStatus::FlashError);

    let commands = link.commands();
    assert_eq!(commands[0].payload.as_ref(), &[0x05]);
    assert_eq!(commands[1].payload.as_ref(), &[0x06, 0x01, 0x01, 0x05]);
}

#[tokio::test]
async fn test_stale_input_is_discarded() {
    let link = ScriptedLink::new();
    link.inject_noise(&[0x55, 0xAA, 0x00]);
    link.reply(&[0x02]);
    assert_eq!(
        sensor(&link).capture_image().await.unwrap(),
        CaptureStatus::NoFinger
    );
}

#[tokio::test]
async fn test_corrupted_reply_is_invalid_data() {
    let link = ScriptedLink::new();
    let mut frame = fingerlight_biometric::Packet::ack(ADDRESS, vec![0x00])
        .encode()
        .to_vec();
    let last = frame.len() - 1;
    frame[last] ^= 0xFF;
    link.reply_raw(frame);

    let err = sensor(&link).capture_image().await.unwrap_err();
    assert!(matches!(err, HardwareError::InvalidData { .. }));
}

#[tokio::test]
async fn test_reply_from_other_address_is_rejected() {
    let link = ScriptedLink::new();
    link.reply_raw(
        fingerlight_biometric::Packet::ack(0x1234_5678, vec![0x00])
            .encode()
            .to_vec(),
    );

    let err = sensor(&link).capture_image().await.unwrap_err();
    assert!(err.to_string().contains("Address mismatch"));
}

#[tokio::test]
async fn test_link_survives_failed_exchange() {
    let link = ScriptedLink::new();
    let mut sensor = sensor(&link);

    assert!(sensor.capture_image().await.is_err());

    link.reply(&[0x00]);
    assert_eq!(sensor.capture_image().await.unwrap(), CaptureStatus::Ok);
    assert!(sensor.into_inner().is_some());
}
