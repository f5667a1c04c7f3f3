//! ---
//! gw_section: "02-record-codec"
//! gw_subsection: "integration-tests"
//! gw_type: "source"
//! gw_scope: "code"
//! gw_description: "Codec laws checked across every registered file type."
//! gw_version: "v0.1.0"
//! gw_owner: "gateway"
//! ---
use d7gw_files::{
    ButtonConfigFile, ButtonFile, DecodeError, EnergyConfigFile, EnergyFile, FileError,
    FileRecord, FileRegistry, Record,
};

fn samples() -> Vec<Record> {
    vec![
        ButtonFile {
            button_id: 0xFF,
            mask: true,
            buttons_state: 7,
        }
        .into(),
        EnergyFile {
            apparent_energy: [i64::MIN, 0, i64::MAX],
            real_energy: [123_456_789, -1, 42],
            current: [1_500, 1_600, -1_700],
            voltage: [i16::MIN, 230, i16::MAX],
            measurement_valid: true,
        }
        .into(),
        ButtonConfigFile {
            transmit_mask_0: false,
            transmit_mask_1: true,
            button_control_menu: false,
            enabled: true,
        }
        .into(),
        EnergyConfigFile {
            interval: u32::MAX,
            enabled: false,
        }
        .into(),
    ]
}

#[test]
fn every_record_survives_encode_then_decode() {
    let registry = FileRegistry::standard();
    for record in samples() {
        let bytes = record.encode();
        assert_eq!(bytes.len(), record.schema().file_size());
        let decoded = registry
            .decode(record.file_id(), &bytes)
            .expect("decode encoded record");
        assert_eq!(decoded, record);
    }
}

#[test]
fn one_byte_short_fails_for_every_file_type() {
    let registry = FileRegistry::standard();
    for schema in registry.schemas() {
        let bytes = vec![0u8; schema.file_size() - 1];
        match registry.decode(schema.file_id, &bytes) {
            Err(FileError::Decode(DecodeError::TruncatedInput {
                expected, actual, ..
            })) => {
                assert_eq!(expected, schema.file_size());
                assert_eq!(actual, schema.file_size() - 1);
            }
            other => panic!("{} decoded a short buffer: {:?}", schema.name, other),
        }
    }
}

#[test]
fn decode_from_consumes_exactly_one_record() {
    let first = ButtonFile {
        button_id: 1,
        mask: true,
        buttons_state: 1,
    };
    let second = ButtonFile {
        button_id: 2,
        mask: false,
        buttons_state: 0,
    };
    let mut stream = first.encode().to_vec();
    stream.extend_from_slice(&second.encode());

    let mut buf = stream.as_slice();
    assert_eq!(ButtonFile::decode_from(&mut buf).expect("first"), first);
    assert_eq!(buf.len(), ButtonFile::FILE_SIZE);
    assert_eq!(ButtonFile::decode_from(&mut buf).expect("second"), second);
    assert!(buf.is_empty());
}

#[test]
fn captured_energy_payload_decodes() {
    let payload = hex::decode(
        "0100000000000000020000000000000003000000000000000400000000000000\
         0500000000000000060000000000000007000000000000000800000000000000\
         0900000000000000e600e700e50001",
    )
    .expect("hex");
    let file = EnergyFile::decode(&payload).expect("decode");
    assert_eq!(file.apparent_energy, [1, 2, 3]);
    assert_eq!(file.real_energy, [4, 5, 6]);
    assert_eq!(file.current, [7, 8, 9]);
    assert_eq!(file.voltage, [230, 231, 229]);
    assert!(file.measurement_valid);
}
