/// Neural voices offered by the speech service. The wire identifier is the
/// `Display` form; any other identifier can still be sent as a plain string.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
pub enum Voice {
    #[default]
    #[strum(serialize = "en-US-AriaNeural")]
    Aria,
    #[strum(serialize = "en-US-GuyNeural")]
    Guy,
    #[strum(serialize = "en-US-JennyNeural")]
    Jenny,
    #[strum(serialize = "en-US-EricNeural")]
    Eric,
    #[strum(serialize = "en-US-ChristopherNeural")]
    Christopher,
    #[strum(serialize = "en-US-MichelleNeural")]
    Michelle,
    #[strum(serialize = "en-GB-LibbyNeural")]
    Libby,
    #[strum(serialize = "en-GB-RyanNeural")]
    Ryan,
    #[strum(serialize = "en-GB-SoniaNeural")]
    Sonia,
    #[strum(serialize = "en-AU-NatashaNeural")]
    Natasha,
    #[strum(serialize = "en-CA-ClaraNeural")]
    Clara,
    #[strum(serialize = "en-IN-NeerjaNeural")]
    Neerja,
}

impl Voice {
    pub fn label(&self) -> &'static str {
        match self {
            Voice::Aria => "Aria (US, Female)",
            Voice::Guy => "Guy (US, Male)",
            Voice::Jenny => "Jenny (US, Female)",
            Voice::Eric => "Eric (US, Male)",
            Voice::Christopher => "Christopher (US, Male)",
            Voice::Michelle => "Michelle (US, Female)",
            Voice::Libby => "Libby (UK, Female)",
            Voice::Ryan => "Ryan (UK, Male)",
            Voice::Sonia => "Sonia (UK, Female)",
            Voice::Natasha => "Natasha (AU, Female)",
            Voice::Clara => "Clara (CA, Female)",
            Voice::Neerja => "Neerja (IN, Female)",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn wire_identifiers_round_trip() {
        for voice in Voice::iter() {
            assert_eq!(Voice::from_str(voice.as_ref()).unwrap(), voice);
        }
        assert_eq!(Voice::iter().count(), 12);
    }

    #[test]
    fn default_voice_is_aria() {
        assert_eq!(Voice::default().to_string(), "en-US-AriaNeural");
        assert_eq!(Voice::default().label(), "Aria (US, Female)");
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        assert!(Voice::from_str("xx-XX-Nobody").is_err());
    }
}
