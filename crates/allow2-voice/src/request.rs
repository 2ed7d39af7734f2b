//! Voice request code: `T A MM NN` encoded as six decimal digits (§3, §4.4)

use allow2_core::{Allow2Config, Allow2Error, Result};

/// The `T` digit of a voice request code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceRequestType {
    /// `0` — quota top-up.
    Quota,
    /// `1` — extend the current session.
    Extend,
    /// `2` — allow the activity to start earlier.
    Earlier,
    /// `3` — lift an active ban.
    LiftBan,
    /// `4`–`6` — reserved, parse but are not actionable.
    Reserved(u8),
    /// `7`–`9` — reserved for multi-code sequences; approval always
    /// returns `Unsupported` until the combining rule is specified.
    MultiCode(u8),
}

impl VoiceRequestType {
    fn from_digit(d: u8) -> Self {
        match d {
            0 => Self::Quota,
            1 => Self::Extend,
            2 => Self::Earlier,
            3 => Self::LiftBan,
            4..=6 => Self::Reserved(d),
            7..=9 => Self::MultiCode(d),
            _ => unreachable!("caller validated d <= 9"),
        }
    }

    fn to_digit(self) -> u8 {
        match self {
            Self::Quota => 0,
            Self::Extend => 1,
            Self::Earlier => 2,
            Self::LiftBan => 3,
            Self::Reserved(d) | Self::MultiCode(d) => d,
        }
    }
}

/// A parsed voice request code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceRequest {
    /// The request type.
    pub request_type: VoiceRequestType,
    /// Activity id modulo 10.
    pub activity: u8,
    /// Minutes requested (`MM * 5`, clamped to 495).
    pub minutes: u16,
    /// Raw two-digit anti-replay nonce, `00`-`99`.
    pub nonce: u8,
    /// The original six-digit code, used as the nonce-ledger key so a
    /// given request (not just its embedded two-digit nonce) is single-use.
    pub code: String,
}

/// Generate a six-digit request code for `request_type`/`activity`/`minutes`,
/// with a fresh random two-digit nonce supplied by the caller's
/// `CryptoProvider`. `minutes` is clamped to `config.voice_max_minutes()`.
pub fn generate_request_code(
    config: &Allow2Config,
    request_type: VoiceRequestType,
    activity: u8,
    minutes: u16,
    nonce: u8,
) -> String {
    let t = request_type.to_digit();
    let a = activity % 10;
    let mm = (minutes / config.voice_minutes_per_increment).min(config.voice_max_increments as u16);
    let nn = nonce % 100;
    format!("{t}{a}{mm:02}{nn:02}")
}

/// Parse a six-digit voice request code. Input is case- and
/// whitespace-tolerant: non-digit characters are stripped before parsing.
/// The `MM` digits are scaled by `config.voice_minutes_per_increment`.
pub fn parse(config: &Allow2Config, input: &str) -> Result<VoiceRequest> {
    let digits: String = input.chars().filter(char::is_ascii_digit).collect();
    if digits.len() != 6 {
        return Err(Allow2Error::malformed(
            "voice request code must be exactly six decimal digits",
        ));
    }

    let bytes: Vec<u8> = digits.bytes().map(|b| b - b'0').collect();
    let t = bytes[0];
    if t > 9 {
        return Err(Allow2Error::malformed("type digit out of range"));
    }
    let activity = bytes[1];
    let mm = bytes[2] * 10 + bytes[3];
    let nn = bytes[4] * 10 + bytes[5];

    Ok(VoiceRequest {
        request_type: VoiceRequestType::from_digit(t),
        activity,
        minutes: mm as u16 * config.voice_minutes_per_increment,
        nonce: nn,
        code: digits,
    })
}
