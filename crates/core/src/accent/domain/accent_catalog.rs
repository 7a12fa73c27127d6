use std::fmt;

/// A target accent the user can pick, mapped to one provider voice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccentOption {
    pub id: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub provider_voice_id: &'static str,
}

impl fmt::Display for AccentOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name)
    }
}

/// Voice used when an accent id is not in the catalog (Rachel, same as british).
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";

pub const ACCENTS: &[AccentOption] = &[
    AccentOption {
        id: "british",
        display_name: "British",
        description: "Received Pronunciation (RP) accent from Southern England",
        provider_voice_id: "21m00Tcm4TlvDq8ikWAM",
    },
    AccentOption {
        id: "american",
        display_name: "American",
        description: "General American accent commonly heard in media",
        provider_voice_id: "6xPz2opT0y5qtoRh1U1Y",
    },
    AccentOption {
        id: "indian",
        display_name: "Indian",
        description: "Indian English accent with characteristic intonation patterns",
        provider_voice_id: "A7AUsa1uITCDpK29MG3m",
    },
    AccentOption {
        id: "australian",
        display_name: "Australian",
        description: "Australian English accent with distinctive vowels",
        provider_voice_id: "ys3XeJJA4ArWMhRpcX1D",
    },
    AccentOption {
        id: "french",
        display_name: "French Accent",
        description: "English spoken with a French accent",
        provider_voice_id: "dDpKZ6xv1gpboV4okVbc",
    },
    AccentOption {
        id: "spanish",
        display_name: "Spanish Accent",
        description: "English spoken with a Spanish accent",
        provider_voice_id: "3l9iCMrNSRR0w51JvFB0",
    },
    AccentOption {
        id: "german",
        display_name: "German Accent",
        description: "English spoken with a German accent",
        provider_voice_id: "BIvP0GN1cAtSRTxNHnWS",
    },
    AccentOption {
        id: "japanese",
        display_name: "Japanese Accent",
        description: "English spoken with a Japanese accent",
        provider_voice_id: "Yko7PKHZNXotIFUBG7I9",
    },
    AccentOption {
        id: "polish",
        display_name: "Polish Accent",
        description: "English spoken with a Polish accent",
        provider_voice_id: "fRyGt0sxyEEgH08Fy7r",
    },
    AccentOption {
        id: "irish",
        display_name: "Irish",
        description: "Irish English accent with distinctive intonation",
        provider_voice_id: "hmMWXCj9K7N5mCPcRkfC",
    },
];

/// Looks up an accent by id, ignoring ASCII case.
pub fn find_accent(accent_id: &str) -> Option<&'static AccentOption> {
    ACCENTS
        .iter()
        .find(|a| a.id.eq_ignore_ascii_case(accent_id.trim()))
}

/// Maps an accent id to the provider voice id.
///
/// Total over all strings: unknown ids resolve to [`DEFAULT_VOICE_ID`]
/// instead of failing. A misspelled id therefore transforms with the default
/// voice; callers that need strictness should check [`find_accent`] first.
pub fn resolve_voice_id(accent_id: &str) -> &'static str {
    match find_accent(accent_id) {
        Some(accent) => accent.provider_voice_id,
        None => {
            log::warn!("Unknown accent '{accent_id}', using default voice");
            DEFAULT_VOICE_ID
        }
    }
}
