use crate::components::vrchat::{EventRecord, GroupRecord};
use serde::Serialize;

/// Event body accepted by the website API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPayload {
    pub group_id: String,
    pub event_id: String,
    pub title: String,
    pub description: String,
    pub starts_at: String,
    pub ends_at: String,
    pub category: String,
    pub access_type: String,
    pub platforms: Vec<String>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

impl From<&EventRecord> for EventPayload {
    fn from(event: &EventRecord) -> Self {
        Self {
            group_id: event.group_id.clone(),
            event_id: event.event_id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            starts_at: event.starts_at.to_string(),
            ends_at: event.ends_at.to_string(),
            category: event.category.clone(),
            access_type: event.access_type.clone(),
            platforms: event.platforms.clone(),
            image_url: event.image_url.clone(),
            tags: event.tags.clone(),
        }
    }
}

/// Group body accepted by the website API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupPayload {
    pub vrc_group_id: String,
    pub name: String,
    pub description: String,
}

impl From<&GroupRecord> for GroupPayload {
    fn from(group: &GroupRecord) -> Self {
        Self {
            vrc_group_id: group.group_id.clone(),
            name: group.name.clone(),
            description: group.description.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::vrchat::time::Timestamp;
    use serde_json::json;

    #[test]
    fn test_event_payload_shape() {
        let event = EventRecord {
            group_id: "grp_1".to_string(),
            event_id: "cal_1".to_string(),
            title: "Meetup".to_string(),
            description: "Weekly".to_string(),
            starts_at: Timestamp::parse("2025-10-15T22:00:00+02:00"),
            ends_at: Timestamp::parse("unknown"),
            category: "hangout".to_string(),
            access_type: "public".to_string(),
            platforms: vec!["android".to_string()],
            image_url: None,
            tags: Vec::new(),
        };

        let value = serde_json::to_value(EventPayload::from(&event)).unwrap();

        assert_eq!(
            value,
            json!({
                "group_id": "grp_1",
                "event_id": "cal_1",
                "title": "Meetup",
                "description": "Weekly",
                "starts_at": "2025-10-15T20:00:00Z",
                "ends_at": "unknown",
                "category": "hangout",
                "access_type": "public",
                "platforms": ["android"],
                "image_url": null,
                "tags": []
            })
        );
    }

    #[test]
    fn test_group_payload_uses_vrc_prefix() {
        let group = GroupRecord {
            group_id: "grp_1".to_string(),
            name: "Relay Club".to_string(),
            description: String::new(),
        };

        let value = serde_json::to_value(GroupPayload::from(&group)).unwrap();
        assert_eq!(value["vrc_group_id"], "grp_1");
        assert_eq!(value["name"], "Relay Club");
    }
}
