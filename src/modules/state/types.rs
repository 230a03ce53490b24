use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub fear: f32,
    pub trust: f32,
    pub anger: f32,
    pub joy: f32,
    pub sadness: f32,
}

impl EmotionalState {
    pub fn new(fear: f32, trust: f32, anger: f32, joy: f32, sadness: f32) -> Self {
        Self {
            fear,
            trust,
            anger,
            joy,
            sadness,
        }
    }

    /// Affect profile for an intent emotion label, matched case-insensitively.
    pub fn from_label(label: &str) -> Option<Self> {
        let profile = match label.trim().to_lowercase().as_str() {
            "neutral" | "calm" => Self::default(),
            "happy" | "joyful" | "cheerful" | "glad" | "excited" | "eager" => Self::new(0.0, 0.0, 0.0, 1.0, 0.0),
            "friendly" | "trusting" | "warm" | "grateful" => Self::new(0.0, 1.0, 0.0, 0.5, 0.0),
            "angry" | "annoyed" | "irritated" | "hostile" => Self::new(0.0, 0.0, 1.0, 0.0, 0.0),
            "afraid" | "scared" | "fearful" | "nervous" | "anxious" => Self::new(1.0, 0.0, 0.0, 0.0, 0.0),
            "sad" | "upset" | "disappointed" | "lonely" => Self::new(0.0, 0.0, 0.0, 0.0, 1.0),
            "suspicious" | "wary" => Self::new(0.5, 0.0, 0.0, 0.0, 0.0),
            _ => return None,
        };
        Some(profile)
    }

    /// Linear step of `rate` (0..=1) from `self` toward `target`.
    pub fn toward(self, target: EmotionalState, rate: f32) -> Self {
        let rate = rate.clamp(0.0, 1.0);
        let step = |from: f32, to: f32| from + (to - from) * rate;
        Self {
            fear: step(self.fear, target.fear),
            trust: step(self.trust, target.trust),
            anger: step(self.anger, target.anger),
            joy: step(self.joy, target.joy),
            sadness: step(self.sadness, target.sadness),
        }
        .clamped()
    }

    /// Every component forced into [0, 1]; NaN collapses to 0.
    pub fn clamped(self) -> Self {
        fn clamp(value: f32) -> f32 {
            if value.is_nan() {
                0.0
            } else {
                value.clamp(0.0, 1.0)
            }
        }

        Self {
            fear: clamp(self.fear),
            trust: clamp(self.trust),
            anger: clamp(self.anger),
            joy: clamp(self.joy),
            sadness: clamp(self.sadness),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelType {
    #[default]
    FaceToFace,
    Sms,
    Forum,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::FaceToFace => "face_to_face",
            ChannelType::Sms => "sms",
            ChannelType::Forum => "forum",
        }
    }

    pub fn profile(&self) -> ChannelProfile {
        match self {
            ChannelType::FaceToFace => ChannelProfile::new("normal", None),
            ChannelType::Sms => ChannelProfile::new("brief", Some(160)),
            ChannelType::Forum => ChannelProfile::new("written", None),
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "face_to_face" => Ok(ChannelType::FaceToFace),
            "sms" => Ok(ChannelType::Sms),
            "forum" => Ok(ChannelType::Forum),
            other => Err(format!("Unknown channel type '{}'", other)),
        }
    }
}

/// Response style and length limit for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelProfile {
    pub style: String,
    pub response_limit: Option<usize>,
}

impl ChannelProfile {
    pub fn new(style: impl Into<String>, response_limit: Option<usize>) -> Self {
        Self {
            style: style.into(),
            response_limit,
        }
    }

    pub fn adapt(&self, output: &str) -> String {
        match self.response_limit {
            Some(limit) if output.chars().count() > limit => output.chars().take(limit).collect(),
            _ => output.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChannelType, EmotionalState};

    #[test]
    fn test_emotion_labels_and_blending() {
        assert_eq!(EmotionalState::from_label(" Angry "), Some(EmotionalState::new(0.0, 0.0, 1.0, 0.0, 0.0)));
        assert_eq!(EmotionalState::from_label("neutral"), Some(EmotionalState::default()));
        assert_eq!(EmotionalState::from_label("bemused"), None);

        let start = EmotionalState::new(0.0, 0.4, 0.0, 0.0, 1.0);
        let target = EmotionalState::new(0.0, 0.0, 0.0, 1.0, 0.0);
        assert_eq!(start.toward(target, 0.5), EmotionalState::new(0.0, 0.2, 0.0, 0.5, 0.5));
        assert_eq!(start.toward(target, 3.0), target);
    }

    #[test]
    fn test_emotional_state_clamped() {
        let state = EmotionalState::new(-0.5, 1.5, 0.3, f32::NAN, 1.0).clamped();
        assert_eq!(state, EmotionalState::new(0.0, 1.0, 0.3, 0.0, 1.0));
    }

    #[test]
    fn test_channel_type_round_trip_names() {
        for channel in [ChannelType::FaceToFace, ChannelType::Sms, ChannelType::Forum] {
            assert_eq!(channel.as_str().parse::<ChannelType>().unwrap(), channel);
        }
        assert!("telepathy".parse::<ChannelType>().is_err());
    }

    #[test]
    fn test_sms_profile_truncates() {
        let profile = ChannelType::Sms.profile();
        let long = "x".repeat(200);
        assert_eq!(profile.adapt(&long).chars().count(), 160);
        assert_eq!(ChannelType::FaceToFace.profile().adapt(&long), long);
    }
}
