/*!
 * Image filenames as time-range carriers.
 *
 * Exported images are named `{channel}_{H}_{MM}_{SS}_{CC}__{H}_{MM}_{SS}_{CC}.ext`,
 * optionally followed by a `_{n}` collision suffix before the extension.
 * Older exports omit the channel token; those belong to the bottom channel.
 */

use std::path::Path;

use crate::channel::Channel;
use crate::errors::NamingError;
use crate::timecode::Timecode;

/// Channel and time range decoded from (or encoded into) an image name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageName {
    pub channel: Channel,
    pub start: Timecode,
    pub end: Timecode,
}

impl ImageName {
    pub fn new(channel: Channel, start: Timecode, end: Timecode) -> Self {
        Self { channel, start, end }
    }

    /// Canonical stem, without collision suffix or extension
    pub fn stem(&self) -> String {
        format!(
            "{}_{}__{}",
            self.channel.token(),
            self.start.to_filename_fields(),
            self.end.to_filename_fields()
        )
    }

    /// Decode a file name (with or without extension)
    pub fn decode(name: &str) -> Result<Self, NamingError> {
        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| name.to_string());

        let (start_part, end_part) = stem
            .split_once("__")
            .ok_or_else(|| NamingError::MissingSeparator(name.to_string()))?;

        let mut start_fields: Vec<&str> = start_part.split('_').collect();
        let channel = match start_fields.first().and_then(|token| Channel::from_token(token)) {
            Some(channel) => {
                start_fields.remove(0);
                channel
            }
            None => Channel::Bottom,
        };

        let end_fields: Vec<&str> = end_part.split('_').collect();

        let start = parse_fields(name, &start_fields)?;
        let end = parse_fields(name, &end_fields)?;

        Ok(Self { channel, start, end })
    }
}

/// Parse the first four fields as `H MM SS CC`. Extra trailing fields are a
/// collision suffix. A three-digit last field is read as milliseconds.
fn parse_fields(name: &str, fields: &[&str]) -> Result<Timecode, NamingError> {
    if fields.len() < 4 {
        return Err(NamingError::TooFewFields {
            name: name.to_string(),
            found: fields.len(),
        });
    }

    let number = |field: &str| -> Result<u64, NamingError> {
        if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NamingError::InvalidField {
                name: name.to_string(),
                field: field.to_string(),
            });
        }
        field.parse::<u64>().map_err(|_| NamingError::InvalidField {
            name: name.to_string(),
            field: field.to_string(),
        })
    };

    let hours = number(fields[0])?;
    let minutes = number(fields[1])?;
    let seconds = number(fields[2])?;

    if minutes >= 60 || seconds >= 60 {
        return Err(NamingError::InvalidField {
            name: name.to_string(),
            field: format!("{}_{}", fields[1], fields[2]),
        });
    }

    let fraction = fields[3];
    let whole = number(fraction)?;
    let millis = if fraction.len() >= 3 {
        number(&fraction[..3])?
    } else {
        whole * 10
    };

    Ok(Timecode::from_millis(
        Timecode::from_fields(hours, minutes, seconds, 0).as_millis() + millis,
    ))
}

/// Sort key placing decodable names in time order and the rest last
pub fn timecode_sort_key(name: &str) -> (bool, Timecode, Channel, String) {
    match ImageName::decode(name) {
        Ok(decoded) => (false, decoded.start, decoded.channel, name.to_string()),
        Err(_) => (true, Timecode::ZERO, Channel::Bottom, name.to_string()),
    }
}
