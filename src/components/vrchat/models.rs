use super::time::Timestamp;
use serde::Deserialize;

/// Calendar event as returned by the VRChat listing and detail endpoints
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RawCalendarEvent {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub access_type: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// One page of a group calendar listing
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CalendarPage {
    #[serde(default, alias = "data")]
    pub results: Vec<RawCalendarEvent>,
    #[serde(default)]
    pub has_next: bool,
}

/// Group as returned by `GET /groups/{groupId}`
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawGroup {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// The authenticated VRChat account
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub display_name: String,
}

/// Fields only the detail endpoint reliably fills in
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDetail {
    pub platforms: Vec<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

impl From<RawCalendarEvent> for EventDetail {
    fn from(raw: RawCalendarEvent) -> Self {
        Self {
            platforms: raw.platforms,
            image_url: raw.image_url.filter(|url| !url.is_empty()),
            tags: raw.tags,
        }
    }
}

/// A normalized group calendar event
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub group_id: String,
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub starts_at: Timestamp,
    pub ends_at: Timestamp,
    pub category: String,
    pub access_type: String,
    pub platforms: Vec<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

impl EventRecord {
    /// Merge a listing entry with its detail lookup
    pub fn from_listing(group_id: &str, raw: RawCalendarEvent, detail: EventDetail) -> Self {
        Self {
            group_id: group_id.to_string(),
            starts_at: Timestamp::parse(&raw.starts_at),
            ends_at: Timestamp::parse(&raw.ends_at),
            event_id: raw.id,
            title: raw.title,
            description: raw.description,
            category: raw.category,
            access_type: raw.access_type,
            platforms: detail.platforms,
            image_url: detail.image_url,
            tags: detail.tags,
        }
    }

    /// Ledger token identifying this event within its group
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.event_id, &self.group_id)
    }
}

/// Build the ledger token for an event of a group
pub fn dedup_key(event_id: &str, group_id: &str) -> String {
    format!("{} from {}", event_id, group_id)
}

/// Display metadata for a VRChat group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupRecord {
    pub group_id: String,
    pub name: String,
    pub description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_page_parses_camel_case() {
        let json = r#"{
            "results": [{
                "id": "cal_1",
                "ownerId": "grp_1",
                "title": "Meetup",
                "startsAt": "2025-10-15T20:00:00.000Z",
                "endsAt": "2025-10-15T21:00:00.000Z",
                "category": "hangout",
                "accessType": "public"
            }],
            "totalCount": 1,
            "hasNext": false
        }"#;

        let page: CalendarPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.results.len(), 1);
        assert_eq!(page.results[0].access_type, "public");
        assert!(page.results[0].platforms.is_empty());
        assert!(!page.has_next);
    }

    #[test]
    fn test_from_listing_merges_detail() {
        let raw = RawCalendarEvent {
            id: "cal_1".to_string(),
            title: "Meetup".to_string(),
            starts_at: "2025-10-15T20:00:00.000Z".to_string(),
            ends_at: "2025-10-15T21:00:00Z".to_string(),
            ..Default::default()
        };
        let detail = EventDetail {
            platforms: vec!["standalonewindows".to_string()],
            image_url: Some("https://example.com/img".to_string()),
            tags: vec!["music".to_string()],
        };

        let record = EventRecord::from_listing("grp_1", raw, detail);

        assert_eq!(record.dedup_key(), "cal_1 from grp_1");
        assert_eq!(record.starts_at.to_string(), "2025-10-15T20:00:00Z");
        assert_eq!(record.platforms, vec!["standalonewindows"]);
        assert_eq!(record.tags, vec!["music"]);
    }
}
