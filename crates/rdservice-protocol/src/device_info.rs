//! The `RD_SERVICE_INFO` device metadata decoder.

use primitives_pid::{Modality, RdDeviceInfo};
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::warn;

use crate::pid_response::extract_attr;

/// Decode the device info XML an RD service returns for the INFO action.
///
/// The metadata lives as attributes on the root element. Decoding is
/// tolerant: fields that cannot be found stay empty, and a record with just
/// the modality set is still a valid observation.
pub fn parse_device_info(xml: &str, modality: Modality) -> RdDeviceInfo {
    let mut info = RdDeviceInfo {
        modality: modality.as_str().to_owned(),
        ..Default::default()
    };

    match strict_root_attrs(xml, &mut info) {
        Ok(()) => {}
        Err(error) => {
            warn!(
                message = "strict device info parse failed, extracting fields textually",
                %error
            );
            textual_attrs(xml, &mut info);
        }
    }

    info
}

/// Read the root element attributes into the record.
fn strict_root_attrs(xml: &str, info: &mut RdDeviceInfo) -> Result<(), quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                // First element is the document root; that's where the
                // metadata attributes live.
                let mut serial = String::new();
                let mut serial_fallback = String::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match key.as_str() {
                        "uid" => serial = value,
                        "sno" => serial_fallback = value,
                        "dpId" => info.device_id = value,
                        "rdsVer" => info.rd_service_version = value,
                        "dc" => info.cert_expiry = value,
                        _ => {}
                    }
                }
                info.serial_number = if serial.is_empty() {
                    serial_fallback
                } else {
                    serial
                };
                return Ok(());
            }
            Event::Eof => return Ok(()),
            _ => {}
        }
        buf.clear();
    }
}

/// Textual extraction over the same attribute set.
fn textual_attrs(xml: &str, info: &mut RdDeviceInfo) {
    let serial = extract_attr(xml, "uid")
        .filter(|v| !v.is_empty())
        .or_else(|| extract_attr(xml, "sno"));
    if let Some(serial) = serial {
        info.serial_number = serial;
    }
    if let Some(value) = extract_attr(xml, "dpId") {
        info.device_id = value;
    }
    if let Some(value) = extract_attr(xml, "rdsVer") {
        info.rd_service_version = value;
    }
    if let Some(value) = extract_attr(xml, "dc") {
        info.cert_expiry = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_attributes_are_extracted() {
        let xml = r#"<RDService info="Mantra RD Service" status="READY" uid="MFS100-7628" dpId="MANTRA.MSIPL" rdsVer="1.0.8" dc="2026-05-01" />"#;
        let info = parse_device_info(xml, Modality::Finger);

        assert_eq!(info.serial_number, "MFS100-7628");
        assert_eq!(info.device_id, "MANTRA.MSIPL");
        assert_eq!(info.rd_service_version, "1.0.8");
        assert_eq!(info.cert_expiry, "2026-05-01");
        assert_eq!(info.modality, "FINGER");
    }

    #[test]
    fn serial_number_falls_back_to_sno() {
        let xml = r#"<RDService sno="S-42" dpId="SCL.MORPHO" />"#;
        let info = parse_device_info(xml, Modality::Finger);
        assert_eq!(info.serial_number, "S-42");
    }

    #[test]
    fn unparseable_info_yields_a_modality_only_record() {
        let info = parse_device_info("", Modality::Iris);
        assert_eq!(info.modality, "IRIS");
        assert_eq!(info.serial_number, "");
        assert_eq!(info.device_id, "");
    }

    #[test]
    fn malformed_info_still_surfaces_attributes() {
        let xml = r#"<RDService uid="X-1" uid="X-1" dpId="TATVIK.TVK" rdsVer="2.1""#;
        let info = parse_device_info(xml, Modality::Face);
        assert_eq!(info.serial_number, "X-1");
        assert_eq!(info.device_id, "TATVIK.TVK");
        assert_eq!(info.rd_service_version, "2.1");
    }
}
