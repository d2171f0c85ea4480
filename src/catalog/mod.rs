//! Static media catalog
//!
//! Holds the topic table (clip + optional transcript per topic), the idle
//! clip, the priority-ordered keyword routes and the fallback line used when
//! no route matches. Populated once at startup and never mutated.

mod routes;
mod topic;

use std::path::Path;

use serde::Deserialize;

pub use routes::KeywordRouter;
pub use topic::{ClipRef, Topic, TopicId, TopicTable};

/// Well-known topics the onboarding flow plays
pub mod topics {
    pub const GREETING: &str = "greeting";
    pub const ZIP: &str = "zip";
    pub const PHONE: &str = "phone";
    pub const START: &str = "start";

    /// Topics the onboarding script cannot run without
    pub const ONBOARDING: [&str; 4] = [GREETING, ZIP, PHONE, START];
}

const DEFAULT_FALLBACK: &str = "I don’t have a video for that yet, but I’m learning!";

/// Errors raised while building a catalog
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid keyword pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog has no {0:?} topic, which onboarding plays")]
    MissingTopic(TopicId),
}

/// Topic table, routes, idle clip and fallback line
#[derive(Debug, Clone)]
pub struct Catalog {
    pub idle: ClipRef,
    pub topics: TopicTable,
    pub router: KeywordRouter,
    pub fallback: String,
}

/// On-disk catalog format
#[derive(Debug, Deserialize)]
struct CatalogFile {
    idle: ClipRef,
    topics: std::collections::HashMap<TopicId, Topic>,
    #[serde(default)]
    routes: Vec<RouteFile>,
    #[serde(default)]
    fallback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RouteFile {
    pattern: String,
    topic: TopicId,
}

impl Catalog {
    /// The cybersecurity assistant's built-in clips, rooted at `media_root`
    pub fn builtin(media_root: &str) -> Result<Self, CatalogError> {
        let root = media_root.trim_end_matches('/');
        let clip = |file: &str| ClipRef::new(format!("{root}/{file}"));

        let entries: [(&str, &str, &str); 9] = [
            (
                topics::GREETING,
                "Greetings.mp4",
                "👋 Hi there, welcome! I’m your cybersecurity assistant. Let’s get started.",
            ),
            (topics::ZIP, "Zip code.mp4", "Please tell me your zip code."),
            (
                topics::PHONE,
                "phone.mp4",
                "Thanks! Now please provide your phone number.",
            ),
            (
                topics::START,
                "Start.mp4",
                "Perfect! You’re all set. Ask me anything about cybersecurity.",
            ),
            (
                "cybersecurity",
                "Cyber Security.mp4",
                "Here’s some information about cybersecurity threats and solutions.",
            ),
            (
                "antivirus",
                "Antivirus.mp4",
                "Here’s some guidance about antivirus software.",
            ),
            (
                "malware",
                "Malware.mp4",
                "Malware is malicious software that can damage or steal data.",
            ),
            (
                "phishing",
                "phishing.mp4",
                "Phishing is a scam to steal sensitive information.",
            ),
            (
                "ransomware",
                "ransomware.mp4",
                "Ransomware locks files until a ransom is paid.",
            ),
        ];

        let topics = entries
            .iter()
            .map(|(id, file, line)| {
                (
                    TopicId::from(*id),
                    Topic {
                        clip: clip(*file),
                        transcript: Some((*line).to_string()),
                    },
                )
            })
            .collect();

        // "hacked", "firewall" and "social cyber security" have no media;
        // their routes still pre-empt the fallback and resolve to nothing.
        let mut router = KeywordRouter::new();
        router.push("cyber|threat", "cybersecurity")?;
        router.push("antivirus", "antivirus")?;
        router.push("malware", "malware")?;
        router.push("phishing", "phishing")?;
        router.push("ransomware", "ransomware")?;
        router.push("hack", "hacked")?;
        router.push("firewall", "firewall")?;
        router.push("social", "social cyber security")?;

        Ok(Self {
            idle: clip("idle.mp4"),
            topics,
            router,
            fallback: DEFAULT_FALLBACK.to_string(),
        })
    }

    /// Load a catalog from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Parse a catalog from its JSON representation.
    ///
    /// Every onboarding topic must be present.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;

        let mut router = KeywordRouter::new();
        for route in &file.routes {
            router.push(&route.pattern, route.topic.clone())?;
        }

        let topics = TopicTable::new(file.topics);
        if let Some(missing) = topics::ONBOARDING
            .iter()
            .map(|id| TopicId::from(*id))
            .find(|id| !topics.contains(id))
        {
            return Err(CatalogError::MissingTopic(missing));
        }

        Ok(Self {
            idle: file.idle,
            topics,
            router,
            fallback: file.fallback.unwrap_or_else(|| DEFAULT_FALLBACK.to_string()),
        })
    }

    /// Transcript line for a topic, if the topic exists and has one
    pub fn transcript(&self, id: &TopicId) -> Option<&str> {
        self.topics.get(id).and_then(|t| t.transcript.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin("/videos/").unwrap();
        assert_eq!(catalog.topics.len(), 9);
        assert_eq!(catalog.router.len(), 8);
        assert_eq!(catalog.idle.as_str(), "/videos/idle.mp4");

        let zip = catalog.topics.get(&TopicId::from(topics::ZIP)).unwrap();
        assert_eq!(zip.clip.as_str(), "/videos/Zip code.mp4");
    }

    #[test]
    fn test_builtin_routes_without_media() {
        let catalog = Catalog::builtin("/videos").unwrap();
        let routed = catalog.router.route("I got hacked").unwrap();
        assert_eq!(routed.as_str(), "hacked");
        assert!(!catalog.topics.contains(routed));
    }

    #[test]
    fn test_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "idle": "clips/idle.webm",
                "topics": {{
                    "greeting": {{ "clip": "clips/hello.webm", "transcript": "Hello!" }},
                    "zip": {{ "clip": "clips/zip.webm" }},
                    "phone": {{ "clip": "clips/phone.webm" }},
                    "start": {{ "clip": "clips/start.webm" }},
                    "wifi": {{ "clip": "clips/wifi.webm" }}
                }},
                "routes": [ {{ "pattern": "wi-?fi", "topic": "wifi" }} ]
            }}"#
        )
        .unwrap();

        let catalog = Catalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.idle.as_str(), "clips/idle.webm");
        assert_eq!(catalog.transcript(&TopicId::from("greeting")), Some("Hello!"));
        assert_eq!(catalog.transcript(&TopicId::from("wifi")), None);
        assert_eq!(catalog.router.route("WIFI password?").unwrap().as_str(), "wifi");
        assert_eq!(catalog.fallback, DEFAULT_FALLBACK);
    }

    #[test]
    fn test_catalog_bad_pattern() {
        let raw = r#"{"idle": "i.mp4", "topics": {}, "routes": [{"pattern": "[", "topic": "x"}]}"#;
        assert!(matches!(
            Catalog::from_json(raw),
            Err(CatalogError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_catalog_missing_onboarding_topic() {
        let raw = r#"{
            "idle": "i.mp4",
            "topics": {
                "zip": { "clip": "zip.mp4" },
                "phone": { "clip": "phone.mp4" },
                "start": { "clip": "start.mp4" }
            }
        }"#;
        match Catalog::from_json(raw) {
            Err(CatalogError::MissingTopic(id)) => assert_eq!(id.as_str(), topics::GREETING),
            other => panic!("expected missing greeting, got {other:?}"),
        }
    }
}
