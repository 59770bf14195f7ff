//! The tolerant PID capture response decoder.
//!
//! Two decode paths over one logical field set: a strict event walk for
//! well-formed responses, and a textual field extraction for the vendors
//! whose XML a strict parser rejects. A strict-parse failure must never
//! lose an otherwise-valid capture, so the decoder is infallible: at worst
//! the whole raw response is carried through as an opaque payload.

use std::collections::BTreeMap;

use base64::Engine as _;
use primitives_pid::{Modality, PidBlock};
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::warn;

/// The Base64 flavor RD services use for the PID payload.
const BASE64: base64::engine::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// The unencrypted `Resp` attributes surfaced by [`decode_pid_header`].
const HEADER_ATTRS: [&str; 6] = ["errCode", "errInfo", "fCount", "iCount", "pCount", "nmPoints"];

/// Session-scoped context merged into the decoded block.
#[derive(Debug, Clone, Copy)]
pub struct ResponseContext<'a> {
    /// The modality the session requested.
    pub modality: Modality,
    /// The error code reported at the transport level, used when the XML
    /// carries no `Resp` error code of its own.
    pub transport_error_code: &'a str,
    /// The error text reported at the transport level, used when the XML
    /// carries no `Resp` error info of its own.
    pub transport_error_info: &'a str,
}

/// Decode a vendor capture response into a [`PidBlock`].
///
/// Fields absent from the response default to empty/zero; absence is not an
/// error. When the response is not XML at all, the raw text is Base64-wrapped
/// into `pid_data` so the caller still receives something forwardable.
pub fn parse_pid_response(xml: &str, ctx: &ResponseContext<'_>) -> PidBlock {
    let mut block = PidBlock {
        error_code: ctx.transport_error_code.to_owned(),
        error_info: ctx.transport_error_info.to_owned(),
        modality: ctx.modality.as_str().to_owned(),
        capture_timestamp: capture_timestamp(),
        ..Default::default()
    };

    match strict_parse(xml, &mut block) {
        Ok(true) => {}
        Ok(false) => {
            warn!(message = "PID response carried no XML elements, keeping it opaque");
            textual_parse(xml, &mut block);
            if block.pid_data.is_empty() {
                block.pid_data = BASE64.encode(xml.as_bytes());
            }
        }
        Err(error) => {
            warn!(
                message = "strict PID XML parse failed, extracting fields textually",
                %error
            );
            textual_parse(xml, &mut block);
            if block.pid_data.is_empty() {
                block.pid_data = BASE64.encode(xml.as_bytes());
            }
        }
    }

    block.device_info.modality = ctx.modality.as_str().to_owned();
    block
}

/// Decode just the unencrypted diagnostic header of a Base64-wrapped PID XML.
///
/// Only the `Resp` attributes are read; the `Data` ciphertext element is
/// never touched.
pub fn decode_pid_header(
    pid_data_base64: &str,
) -> Result<BTreeMap<String, String>, HeaderDecodeError> {
    let xml = String::from_utf8(BASE64.decode(pid_data_base64.trim())?)?;

    let strict_attrs = strict_resp_attrs(&xml).ok();
    let mut header = BTreeMap::new();
    for name in HEADER_ATTRS {
        let value = match &strict_attrs {
            Some(attrs) => attrs.get(name).cloned(),
            None => extract_attr(&xml, name),
        };
        header.insert(name.to_owned(), value.unwrap_or_default());
    }
    Ok(header)
}

/// The error produced when a PID header payload cannot be decoded at all.
#[derive(Debug, Error)]
pub enum HeaderDecodeError {
    /// The payload is not valid Base64.
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded payload is not valid UTF-8 text.
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The current wall-clock time in the `YYYY-MM-DDTHH:MM:SS` form the PID
/// block carries.
fn capture_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string()
}

/// Strict event walk over the response envelope.
///
/// Returns whether any element was seen at all: plain text is not a parse
/// error for an event reader, but a response without a single element is
/// not XML and must take the opaque path.
fn strict_parse(xml: &str, block: &mut PidBlock) -> Result<bool, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut current_element = String::new();
    let mut saw_element = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) => {
                saw_element = true;
                current_element = String::from_utf8_lossy(e.name().as_ref()).to_string();

                match current_element.as_str() {
                    "Resp" => {
                        // A present Resp element implies at least one capture
                        // unless its fCount says otherwise.
                        block.captured_count = 1;
                        for attr in e.attributes() {
                            let attr = attr?;
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            match key.as_str() {
                                "errCode" if !value.is_empty() => block.error_code = value,
                                "errInfo" if !value.is_empty() => block.error_info = value,
                                "fCount" => {
                                    block.captured_count = value.parse().unwrap_or(1);
                                }
                                _ => {}
                            }
                        }
                    }
                    "DeviceInfo" => {
                        for attr in e.attributes() {
                            let attr = attr?;
                            let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                            let value = String::from_utf8_lossy(&attr.value).to_string();
                            match key.as_str() {
                                "dpId" => block.device_info.device_id = value,
                                "rdsVer" => block.device_info.rd_service_version = value,
                                "dc" => block.device_info.cert_expiry = value,
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(e) => {
                let text = e.unescape()?.trim().to_string();
                match current_element.as_str() {
                    "Data" => block.pid_data = text,
                    "Hmac" => block.hmac = text,
                    "SessionKey" => block.session_key = text,
                    _ => {}
                }
            }
            Event::End(_) => current_element.clear(),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(saw_element)
}

/// Strictly collect the attributes of the `Resp` element.
fn strict_resp_attrs(xml: &str) -> Result<BTreeMap<String, String>, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"Resp" => {
                let mut attrs = BTreeMap::new();
                for attr in e.attributes() {
                    let attr = attr?;
                    attrs.insert(
                        String::from_utf8_lossy(attr.key.as_ref()).to_string(),
                        String::from_utf8_lossy(&attr.value).to_string(),
                    );
                }
                return Ok(attrs);
            }
            Event::Eof => return Ok(BTreeMap::new()),
            _ => {}
        }
        buf.clear();
    }
}

/// Textual extraction of the same field set the strict walk covers.
fn textual_parse(xml: &str, block: &mut PidBlock) {
    if let Some(value) = extract_attr(xml, "errCode").filter(|v| !v.is_empty()) {
        block.error_code = value;
    }
    if let Some(value) = extract_attr(xml, "errInfo").filter(|v| !v.is_empty()) {
        block.error_info = value;
    }
    if let Some(value) = extract_attr(xml, "fCount") {
        block.captured_count = value.parse().unwrap_or(1);
    }
    if let Some(value) = extract_attr(xml, "dpId") {
        block.device_info.device_id = value;
    }
    if let Some(value) = extract_attr(xml, "rdsVer") {
        block.device_info.rd_service_version = value;
    }
    if let Some(value) = extract_attr(xml, "dc") {
        block.device_info.cert_expiry = value;
    }
    if let Some(text) = extract_element_text(xml, "Data") {
        block.pid_data = text;
    }
    if let Some(text) = extract_element_text(xml, "Hmac") {
        block.hmac = text;
    }
    if let Some(text) = extract_element_text(xml, "SessionKey") {
        block.session_key = text;
    }
}

/// Find a quoted `name="value"` attribute by plain text search.
///
/// The character before the name must be a separator, so `dc` cannot match
/// inside `rdc` or `mdc`.
pub(crate) fn extract_attr(xml: &str, name: &str) -> Option<String> {
    let bytes = xml.as_bytes();
    let mut search_from = 0;
    while let Some(pos) = xml[search_from..].find(name) {
        let start = search_from + pos;
        search_from = start + name.len();

        if start > 0 {
            let prev = bytes[start - 1] as char;
            if !prev.is_whitespace() && prev != '<' {
                continue;
            }
        }

        let rest = xml[start + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let quote = rest.chars().next()?;
        if quote != '"' && quote != '\'' {
            continue;
        }
        let rest = &rest[1..];
        let end = rest.find(quote)?;
        return Some(rest[..end].to_owned());
    }
    None
}

/// Find the text content of `<tag ...>text</tag>` by plain text search.
fn extract_element_text(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}");
    let close = format!("</{tag}");

    let mut search_from = 0;
    while let Some(pos) = xml[search_from..].find(&open) {
        let start = search_from + pos;
        search_from = start + open.len();

        // The name must end here, so `<Data` cannot match `<DataBlock`.
        let after = &xml[start + open.len()..];
        match after.chars().next() {
            Some(c) if c.is_whitespace() || c == '>' || c == '/' => {}
            _ => continue,
        }

        let gt = after.find('>')?;
        if after[..gt].trim_end().ends_with('/') {
            // Self-closing element carries no text.
            return None;
        }
        let content = &after[gt + 1..];
        let end = content.find(&close)?;
        let text = content[..end].trim();
        return Some(text.to_owned()).filter(|t| !t.is_empty());
    }
    None
}
