//! Pure device and host heuristics. Everything here is browser-free so it can
//! be unit tested natively; [`super::adapter`] feeds it live values.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

fn mobile_agent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Android|webOS|iPhone|iPad|iPod|BlackBerry|IEMobile|Opera Mini")
            .expect("valid regex")
    })
}

fn ios_agent_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"iPad|iPhone|iPod").expect("valid regex"))
}

/// Narrow viewport or a known mobile user agent.
pub fn is_mobile(width: f64, user_agent: &str, breakpoint_px: f64) -> bool {
    width <= breakpoint_px || mobile_agent_regex().is_match(user_agent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobileOs {
    Ios,
    Android,
    Other,
}

impl MobileOs {
    pub fn detect(user_agent: &str) -> Self {
        if ios_agent_regex().is_match(user_agent) {
            Self::Ios
        } else if user_agent.contains("Android") {
            Self::Android
        } else {
            Self::Other
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for MobileOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutChange {
    EnteredMobile,
    LeftMobile,
}

/// Remembers the last mobile classification and reports only transitions.
#[derive(Debug)]
pub struct LayoutTracker {
    mobile: bool,
}

impl LayoutTracker {
    pub fn new(mobile: bool) -> Self {
        Self { mobile }
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn update(&mut self, mobile: bool) -> Option<LayoutChange> {
        if mobile == self.mobile {
            return None;
        }
        self.mobile = mobile;
        Some(if mobile {
            LayoutChange::EnteredMobile
        } else {
            LayoutChange::LeftMobile
        })
    }
}

/// `navigator.connection` says data is scarce.
pub fn is_constrained_network(save_data: bool, effective_type: Option<&str>) -> bool {
    save_data || effective_type.is_some_and(|t| t.contains("2g"))
}

/// Double-tap detector for `touchend` timestamps (milliseconds).
#[derive(Debug)]
pub struct TapDebounce {
    window_ms: f64,
    last: Option<f64>,
}

impl TapDebounce {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            last: None,
        }
    }

    /// Records a tap at `now` and returns `true` when it follows the previous
    /// one closely enough to be suppressed.
    pub fn register(&mut self, now: f64) -> bool {
        let suppress = self
            .last
            .is_some_and(|last| now - last <= self.window_ms);
        self.last = Some(now);
        suppress
    }
}

pub fn should_show_back_button(history_len: u32) -> bool {
    history_len > 1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some("dark") => Self::Dark,
            _ => Self::Light,
        }
    }

    /// Value for the root element's `data-theme` attribute.
    pub fn data_theme(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}
