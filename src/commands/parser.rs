use crate::components::vrchat::time::Timestamp;
use crate::components::vrchat::EventRecord;

pub const ADD_GROUP_USAGE: &str = "  add_group <group_id>";
pub const UPDATE_GROUP_USAGE: &str = "  update_group <group_id>";
pub const DELETE_GROUP_USAGE: &str = "  delete_group <group_id>";
pub const ADD_EVENT_USAGE: &str = concat!(
    "  add_event <group_id> <event_id> <title> <description> <start_time> <end_time> ",
    "<category> <access_type> <platforms>\n",
    "  Example:\n",
    "  add_event grp_123 cal_123 title description 2025-10-15T20:00:00Z 2025-10-15T21:00:00Z ",
    "category public standalonewindows,android",
);
pub const UPDATE_EVENT_USAGE: &str = concat!(
    "  update_event <website_event_id> <group_id> <event_id> <title> <description> ",
    "<start_time> <end_time> <category> <access_type> <platforms> <image_url|none> <tags|none>\n",
    "  Example:\n",
    "  update_event 123 grp_123 cal_123 title description 2025-10-15T20:00:00Z ",
    "2025-10-15T21:00:00Z category public standalonewindows,android ",
    "https://api.vrchat.cloud/api/1/file/file_123/1/file tag,tag1,tag2",
);
pub const DELETE_EVENT_USAGE: &str =
    "  delete_event <website_event_id>\n  Example:\n  delete_event 123";

/// A console command with its arguments
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Exit,
    ReloadEnv(Vec<String>),
    Login,
    AddGroup(String),
    UpdateGroup(String),
    DeleteGroup(String),
    Refetch,
    AddEvent(EventRecord),
    UpdateEvent {
        website_id: String,
        event: EventRecord,
    },
    DeleteEvent(String),
}

/// Why a line did not produce a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Usage(&'static str),
    Unknown(String),
}

impl Command {
    /// Parse one space separated console line
    pub fn parse(line: &str) -> Result<Command, ParseError> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(first) = parts.first() else {
            return Err(ParseError::Empty);
        };

        match first.to_lowercase().as_str() {
            "help" => Ok(Command::Help),
            "exit" | "quit" => Ok(Command::Exit),
            "reload_env" => Ok(Command::ReloadEnv(
                parts[1..].iter().map(|s| s.to_string()).collect(),
            )),
            "login" => Ok(Command::Login),
            "refetch" => Ok(Command::Refetch),
            "add_group" => single_arg(&parts, ADD_GROUP_USAGE).map(Command::AddGroup),
            "update_group" => single_arg(&parts, UPDATE_GROUP_USAGE).map(Command::UpdateGroup),
            "delete_group" => single_arg(&parts, DELETE_GROUP_USAGE).map(Command::DeleteGroup),
            "add_event" => {
                if parts.len() < 10 {
                    return Err(ParseError::Usage(ADD_EVENT_USAGE));
                }
                Ok(Command::AddEvent(event_from_args(&parts[1..10], None, Vec::new())))
            }
            "update_event" => {
                if parts.len() < 13 {
                    return Err(ParseError::Usage(UPDATE_EVENT_USAGE));
                }
                Ok(Command::UpdateEvent {
                    website_id: parts[1].to_string(),
                    event: event_from_args(
                        &parts[2..11],
                        optional_arg(parts[11]).map(str::to_string),
                        optional_arg(parts[12]).map(split_list).unwrap_or_default(),
                    ),
                })
            }
            "delete_event" => {
                if parts.len() < 2 {
                    return Err(ParseError::Usage(DELETE_EVENT_USAGE));
                }
                Ok(Command::DeleteEvent(parts[1].to_string()))
            }
            other => Err(ParseError::Unknown(other.to_string())),
        }
    }
}

fn single_arg(parts: &[&str], usage: &'static str) -> Result<String, ParseError> {
    match parts {
        [_, arg] => Ok(arg.to_string()),
        _ => Err(ParseError::Usage(usage)),
    }
}

/// `none` stands for an absent value
fn optional_arg(arg: &str) -> Option<&str> {
    if arg.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(arg)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a record from `<group_id> <event_id> <title> <description> <start> <end>
/// <category> <access_type> <platforms>`
fn event_from_args(args: &[&str], image_url: Option<String>, tags: Vec<String>) -> EventRecord {
    EventRecord {
        group_id: args[0].to_string(),
        event_id: args[1].to_string(),
        title: args[2].to_string(),
        description: args[3].to_string(),
        starts_at: Timestamp::parse(args[4]),
        ends_at: Timestamp::parse(args[5]),
        category: args[6].to_string(),
        access_type: args[7].to_string(),
        platforms: split_list(args[8]),
        image_url,
        tags,
    }
}
