use std::path::PathBuf;

pub const HELP: &str = "\
login:      phone <country-code> <number> | otp <code>
dashboard:  users (* = saved chat) | search [term] | create <name> | delete <name>
            open <name> | close | send <text> | image <path> | more | logout
anywhere:   help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Phone { country_code: String, number: String },
    Otp(String),
    Users,
    Search(String),
    Create(String),
    Delete(String),
    Open(String),
    Close,
    Send(String),
    Image(PathBuf),
    More,
    Logout,
    Help,
    Quit,
}

/// Parse one input line. Blank lines are `Ok(None)`; bad input returns usage text.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return Ok(None);
    }

    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest),
        None => (line.trim_end(), ""),
    };
    let arg = rest.trim();

    let command = match verb {
        "phone" => {
            let mut parts = arg.split_whitespace();
            match (parts.next(), parts.next(), parts.next()) {
                (Some(code), Some(number), None) => Command::Phone {
                    country_code: code.to_string(),
                    number: number.to_string(),
                },
                _ => return Err("usage: phone <country-code> <number>".into()),
            }
        }
        "otp" => Command::Otp(required(arg, "otp <code>")?),
        "users" => Command::Users,
        "search" => Command::Search(arg.to_string()),
        "create" => Command::Create(required(arg, "create <name>")?),
        "delete" => Command::Delete(required(arg, "delete <name>")?),
        "open" => Command::Open(required(arg, "open <name>")?),
        "close" => Command::Close,
        // keep the text as typed; the pipeline decides what counts as empty
        "send" => Command::Send(rest.to_string()),
        "image" => Command::Image(PathBuf::from(required(arg, "image <path>")?)),
        "more" => Command::More,
        "logout" => Command::Logout,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

fn required(arg: &str, usage: &str) -> Result<String, String> {
    if arg.is_empty() {
        Err(format!("usage: {}", usage))
    } else {
        Ok(arg.to_string())
    }
}

/// MIME type for an image file, judged by extension.
pub fn image_mime(path: &std::path::Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        _ => return None,
    };
    Some(mime)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn parses_login_commands() {
        assert_eq!(
            parse("phone +44 7700900123").unwrap(),
            Some(Command::Phone {
                country_code: "+44".into(),
                number: "7700900123".into()
            })
        );
        assert_eq!(parse("otp 123456").unwrap(), Some(Command::Otp("123456".into())));
        assert!(parse("phone +44").is_err());
    }

    #[test]
    fn names_may_contain_spaces() {
        assert_eq!(
            parse("create  Mary Ann ").unwrap(),
            Some(Command::Create("Mary Ann".into()))
        );
    }

    #[test]
    fn send_keeps_raw_text() {
        assert_eq!(parse("send").unwrap(), Some(Command::Send(String::new())));
        assert_eq!(
            parse("send  hi  there").unwrap(),
            Some(Command::Send(" hi  there".into()))
        );
    }

    #[test]
    fn search_may_be_cleared() {
        assert_eq!(parse("search").unwrap(), Some(Command::Search(String::new())));
    }

    #[test]
    fn blank_and_unknown() {
        assert_eq!(parse("   ").unwrap(), None);
        assert!(parse("dance").unwrap_err().contains("unknown command"));
        assert!(parse("open").is_err());
    }

    #[test]
    fn image_mime_by_extension() {
        assert_eq!(image_mime(Path::new("cat.JPG")), Some("image/jpeg"));
        assert_eq!(image_mime(Path::new("a/b.png")), Some("image/png"));
        assert_eq!(image_mime(Path::new("notes.txt")), None);
        assert_eq!(image_mime(Path::new("noext")), None);
    }
}
