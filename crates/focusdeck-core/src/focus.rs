use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durations are in minutes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FocusSettings {
    pub work_duration: u32,
    pub break_duration: u32,
    pub long_break_duration: u32,
    pub sessions_until_long_break: u32,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            work_duration: 25,
            break_duration: 5,
            long_break_duration: 15,
            sessions_until_long_break: 4,
        }
    }
}

impl FocusSettings {
    pub fn merge(&mut self, patch: FocusSettingsPatch) {
        if let Some(v) = patch.work_duration {
            self.work_duration = v;
        }
        if let Some(v) = patch.break_duration {
            self.break_duration = v;
        }
        if let Some(v) = patch.long_break_duration {
            self.long_break_duration = v;
        }
        if let Some(v) = patch.sessions_until_long_break {
            self.sessions_until_long_break = v;
        }
    }

    /// A divisor of zero never yields a long break.
    pub fn is_long_break_due(&self, session: u32) -> bool {
        session.checked_rem(self.sessions_until_long_break) == Some(0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FocusSettingsPatch {
    pub work_duration: Option<u32>,
    pub break_duration: Option<u32>,
    pub long_break_duration: Option<u32>,
    pub sessions_until_long_break: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Work,
    ShortBreak,
    LongBreak,
}

impl Segment {
    pub fn of(focus: &FocusState) -> Self {
        if !focus.is_break {
            Segment::Work
        } else if focus.settings.is_long_break_due(focus.current_session) {
            Segment::LongBreak
        } else {
            Segment::ShortBreak
        }
    }

    pub fn minutes(self, settings: &FocusSettings) -> u32 {
        match self {
            Segment::Work => settings.work_duration,
            Segment::ShortBreak => settings.break_duration,
            Segment::LongBreak => settings.long_break_duration,
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Segment::Work)
    }

    pub fn title(self) -> &'static str {
        match self {
            Segment::Work => "Focus Time",
            Segment::ShortBreak | Segment::LongBreak => "Break Time",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FocusState {
    pub is_active: bool,
    pub current_task_id: Option<Uuid>,
    pub current_session: u32,
    pub is_break: bool,
    pub settings: FocusSettings,
}

impl FocusState {
    pub fn segment(&self) -> Segment {
        Segment::of(self)
    }

    pub fn target_minutes(&self) -> u32 {
        self.segment().minutes(&self.settings)
    }

    pub fn target_seconds(&self) -> u32 {
        self.target_minutes().saturating_mul(60)
    }

    /// Back to inactive; settings survive.
    pub fn reset(&mut self) {
        self.is_active = false;
        self.current_task_id = None;
        self.current_session = 0;
        self.is_break = false;
    }
}
