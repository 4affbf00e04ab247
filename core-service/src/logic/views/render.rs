//! Result rendering
//!
//! Turns a `DetectionResult` into the presentational model the result
//! screen shows. Component sections exist only for fields the server sent.

use std::fmt;

use serde::Serialize;

use crate::logic::detection::DetectionResult;

const HIGH_RISK_BELOW: f64 = 0.3;
const MODERATE_RISK_BELOW: f64 = 0.7;

const MALWARE_ADVICE: &str = "This file contains suspicious patterns or known malware signatures. Do not execute or open this file.";
const CLEAN_ADVICE: &str = "No malware signatures detected. However, always exercise caution with files from untrusted sources.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLevel {
    High,
    Moderate,
    Low,
}

impl RiskLevel {
    pub fn from_score(score: f64) -> Self {
        if score < HIGH_RISK_BELOW {
            RiskLevel::High
        } else if score < MODERATE_RISK_BELOW {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::Low => "Low Risk",
        }
    }
}

/// One optional card of the component breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentSection {
    Visual {
        percent: String,
    },
    Auditory {
        percent: String,
    },
    Signature {
        has_signature: Option<bool>,
        /// Listed only when a signature was found
        matches: Option<Vec<String>>,
    },
    Metadata {
        keys: u64,
    },
    Temporal {
        is_video: Option<bool>,
        /// Frame count and jitter are shown for videos only
        frame_count: Option<u64>,
        motion_jitter: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    /// File the result belongs to (selected file or re-opened history entry)
    pub source_name: Option<String>,
    pub malware_detected: bool,
    pub anomaly: Option<String>,
    pub score_percent: Option<String>,
    pub risk: Option<RiskLevel>,
    /// `None` when the response carried no `components` object
    pub component_count: Option<usize>,
    pub sections: Vec<ComponentSection>,
}

impl ResultView {
    pub fn from_result(result: &DetectionResult, source_name: Option<&str>) -> Self {
        let mut sections = Vec::new();

        if let Some(components) = &result.components {
            if let Some(score) = components.visual_score {
                sections.push(ComponentSection::Visual { percent: percent(score) });
            }
            if let Some(score) = components.auditory_score {
                sections.push(ComponentSection::Auditory { percent: percent(score) });
            }
            if let Some(check) = &components.signature_check {
                let matches = match check.has_signature {
                    Some(true) => check.matches.clone(),
                    _ => None,
                };
                sections.push(ComponentSection::Signature {
                    has_signature: check.has_signature,
                    matches,
                });
            }
            if let Some(keys) = components.metadata_keys {
                sections.push(ComponentSection::Metadata { keys });
            }
            if let Some(temporal) = &components.temporal_check {
                let is_video = temporal.is_video == Some(true);
                sections.push(ComponentSection::Temporal {
                    is_video: temporal.is_video,
                    frame_count: temporal.frame_count.filter(|_| is_video),
                    motion_jitter: temporal
                        .motion_jitter
                        .filter(|_| is_video)
                        .map(|j| format!("{:.3}", j)),
                });
            }
        }

        Self {
            source_name: source_name.map(str::to_string),
            malware_detected: result.is_malware(),
            anomaly: result.anomaly_string.clone(),
            score_percent: result.score.map(percent),
            risk: result.score.map(RiskLevel::from_score),
            component_count: result.components.as_ref().map(|c| c.key_count()),
            sections,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.malware_detected {
            "MALWARE DETECTED"
        } else {
            "NO MALWARE DETECTED"
        }
    }

    pub fn advice(&self) -> &'static str {
        if self.malware_detected {
            MALWARE_ADVICE
        } else {
            CLEAN_ADVICE
        }
    }
}

fn percent(score: f64) -> String {
    format!("{:.1}%", score * 100.0)
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "YES",
        Some(false) => "NO",
        None => "unknown",
    }
}

impl fmt::Display for ResultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.source_name {
            writeln!(f, "File: {}", name)?;
        }
        writeln!(f, "Malware Detection Status: {}", self.status_label())?;
        writeln!(f, "Anomaly Type: {}", self.anomaly.as_deref().unwrap_or("unknown"))?;
        writeln!(f, "{}", self.advice())?;

        match (&self.score_percent, self.risk) {
            (Some(score), Some(risk)) => writeln!(f, "Authenticity Score: {} ({})", score, risk.label())?,
            _ => writeln!(f, "Authenticity Score: unknown")?,
        }

        if let Some(count) = self.component_count {
            writeln!(f, "Component Analysis: {} components", count)?;
        }

        for section in &self.sections {
            match section {
                ComponentSection::Visual { percent } => {
                    writeln!(f, "  Visual Analysis (CNN): {}", percent)?;
                }
                ComponentSection::Auditory { percent } => {
                    writeln!(f, "  Auditory Analysis (MFCC): {}", percent)?;
                }
                ComponentSection::Signature { has_signature, matches } => {
                    writeln!(f, "  Malware Signature Scanner: signature found {}", yes_no(*has_signature))?;
                    if let Some(matches) = matches {
                        writeln!(f, "    Matches: {}", matches.join(", "))?;
                    }
                }
                ComponentSection::Metadata { keys } => {
                    writeln!(f, "  Metadata Forensics (EXIF): {} keys", keys)?;
                }
                ComponentSection::Temporal { is_video, frame_count, motion_jitter } => {
                    writeln!(f, "  Temporal Analysis (Video): video {}", yes_no(*is_video))?;
                    if let Some(frames) = frame_count {
                        writeln!(f, "    Frames Analyzed: {}", frames)?;
                    }
                    if let Some(jitter) = motion_jitter {
                        writeln!(f, "    Motion Jitter: {}", jitter)?;
                    }
                }
            }
        }

        Ok(())
    }
}
