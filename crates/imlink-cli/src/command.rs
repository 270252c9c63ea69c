//! Parsing of typed input lines.

use thiserror::Error;

/// One user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/connect`
    Connect,
    /// `/login <username> <password>`
    Login { username: String, password: String },
    /// `/register <username> <password> <nickname>`
    Register { username: String, password: String, nickname: String },
    /// `/msg <user_id> <text>`
    Msg { to_user_id: String, text: String },
    /// `/gmsg <group_id> <text>`
    GroupMsg { group_id: String, text: String },
    /// Plain text: goes to the open conversation
    Say { text: String },
    /// `/open <user_id>`
    Open { user_id: String },
    /// `/close`
    Close,
    /// `/friends`
    Friends,
    /// `/groups`
    Groups,
    /// `/users`
    Users,
    /// `/apply <username> [greeting]`
    Apply { username: String, greeting: Option<String> },
    /// `/accept <apply_id>`
    Accept { apply_id: String },
    /// `/reject <apply_id>`
    Reject { apply_id: String },
    /// `/delete <user_id>`
    Delete { user_id: String },
    /// `/create <name> <uid,uid,...>`
    Create { name: String, members: Vec<String> },
    /// `/members <group_id>`
    Members { group_id: String },
    /// `/invite <group_id> <uid,uid,...>`
    Invite { group_id: String, members: Vec<String> },
    /// `/kick <group_id> <user_id>`
    Kick { group_id: String, user_id: String },
    /// `/quit <group_id>`
    Quit { group_id: String },
    /// `/dismiss <group_id>`
    Dismiss { group_id: String },
    /// `/logout`
    Logout,
    /// `/help`
    Help,
    /// `/exit`
    Exit,
}

/// Why a line could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Nothing but whitespace.
    #[error("empty input")]
    Empty,

    /// Unrecognized `/word`.
    #[error("unknown command /{0}, try /help")]
    Unknown(String),

    /// Known command with missing arguments.
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Help text listing every command.
pub const HELP: &str = "\
/connect                          connect to the server
/login <username> <password>      log in
/register <user> <pass> <nick>    create an account
/msg <user_id> <text>             send a direct message
/gmsg <group_id> <text>           send a group message
/open <user_id>                   open a conversation (plain text goes there)
/close                            close the open conversation
/users  /friends  /groups         refresh lists
/apply <username> [greeting]      send a friend request
/accept <apply_id>  /reject <apply_id>
/delete <user_id>                 remove a friend
/create <name> <uid,uid,...>      create a group
/members <group_id>               list group members
/invite <group_id> <uid,uid,...>  invite members
/kick <group_id> <user_id>        remove a member
/quit <group_id>                  leave a group
/dismiss <group_id>               dismiss a group you own
/logout  /exit";

/// Parse one input line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CommandError::Empty);
    }

    let Some(body) = line.strip_prefix('/') else {
        return Ok(Command::Say { text: line.to_owned() });
    };

    let (name, rest) = split_word(body);
    let command = match name {
        "connect" => Command::Connect,
        "login" => {
            let [username, password] = words(rest, "/login <username> <password>")?;
            Command::Login { username, password }
        },
        "register" => {
            let [username, password, nickname] =
                words(rest, "/register <username> <password> <nickname>")?;
            Command::Register { username, password, nickname }
        },
        "msg" => {
            let (to_user_id, text) = word_and_text(rest, "/msg <user_id> <text>")?;
            Command::Msg { to_user_id, text }
        },
        "gmsg" => {
            let (group_id, text) = word_and_text(rest, "/gmsg <group_id> <text>")?;
            Command::GroupMsg { group_id, text }
        },
        "open" => {
            let [user_id] = words(rest, "/open <user_id>")?;
            Command::Open { user_id }
        },
        "close" => Command::Close,
        "friends" => Command::Friends,
        "groups" => Command::Groups,
        "users" => Command::Users,
        "apply" => {
            let (username, greeting) = split_word(rest);
            if username.is_empty() {
                return Err(CommandError::Usage("/apply <username> [greeting]"));
            }
            let greeting = (!greeting.is_empty()).then(|| greeting.to_owned());
            Command::Apply { username: username.to_owned(), greeting }
        },
        "accept" => {
            let [apply_id] = words(rest, "/accept <apply_id>")?;
            Command::Accept { apply_id }
        },
        "reject" => {
            let [apply_id] = words(rest, "/reject <apply_id>")?;
            Command::Reject { apply_id }
        },
        "delete" => {
            let [user_id] = words(rest, "/delete <user_id>")?;
            Command::Delete { user_id }
        },
        "create" => {
            let [name, members] = words(rest, "/create <name> <uid,uid,...>")?;
            Command::Create { name, members: id_list(&members) }
        },
        "members" => {
            let [group_id] = words(rest, "/members <group_id>")?;
            Command::Members { group_id }
        },
        "invite" => {
            let [group_id, members] = words(rest, "/invite <group_id> <uid,uid,...>")?;
            Command::Invite { group_id, members: id_list(&members) }
        },
        "kick" => {
            let [group_id, user_id] = words(rest, "/kick <group_id> <user_id>")?;
            Command::Kick { group_id, user_id }
        },
        "quit" => {
            let [group_id] = words(rest, "/quit <group_id>")?;
            Command::Quit { group_id }
        },
        "dismiss" => {
            let [group_id] = words(rest, "/dismiss <group_id>")?;
            Command::Dismiss { group_id }
        },
        "logout" => Command::Logout,
        "help" => Command::Help,
        "exit" => Command::Exit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(command)
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (s, ""),
    }
}

/// Exactly `N` whitespace-separated words.
fn words<const N: usize>(s: &str, usage: &'static str) -> Result<[String; N], CommandError> {
    let parts: Vec<String> = s.split_whitespace().map(str::to_owned).collect();
    parts.try_into().map_err(|_| CommandError::Usage(usage))
}

/// One word followed by free text.
fn word_and_text(s: &str, usage: &'static str) -> Result<(String, String), CommandError> {
    match split_word(s) {
        (word, text) if !word.is_empty() && !text.is_empty() => {
            Ok((word.to_owned(), text.to_owned()))
        },
        _ => Err(CommandError::Usage(usage)),
    }
}

fn id_list(s: &str) -> Vec<String> {
    s.split(',').map(str::trim).filter(|id| !id.is_empty()).map(str::to_owned).collect()
}
