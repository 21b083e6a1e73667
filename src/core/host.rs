//! Host strings in the `[user@]host[:port]` form accepted on the command line.

use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

// Hostnames, IPv4 and IPv6 literals. Anything else could escape the site path,
// and a leading '-' would be read by ssh as an option.
static HOST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9:][A-Za-z0-9._:-]*$").unwrap());

static USER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9._-]*$").unwrap());

/// Host name or address safe to hand to ssh and to use as a directory name.
pub fn is_valid_host_name(host: &str) -> bool {
    HOST_PATTERN.is_match(host) && !host.chars().all(|c| c == '.')
}

pub fn is_valid_user(user: &str) -> bool {
    USER_PATTERN.is_match(user)
}

impl HostSpec {
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(Error::validation_invalid_argument(
                "host",
                "Host is empty",
                None,
            ));
        }

        let (user, rest) = match input.split_once('@') {
            Some(("", _)) => {
                return Err(Error::validation_invalid_argument(
                    "host",
                    "User before '@' is empty",
                    Some(input.to_string()),
                ))
            }
            Some((user, _)) if !is_valid_user(user) => {
                return Err(Error::validation_invalid_argument(
                    "user",
                    format!("'{}' is not a valid user name", user),
                    Some(input.to_string()),
                ))
            }
            Some((user, rest)) => (Some(user.to_string()), rest),
            None => (None, input),
        };

        let (host, port) = split_port(rest, input)?;

        if !is_valid_host_name(host) {
            return Err(Error::validation_invalid_argument(
                "host",
                format!("'{}' is not a valid host name or address", host),
                Some(input.to_string()),
            ));
        }

        Ok(Self {
            user,
            host: host.to_string(),
            port,
        })
    }

    /// Name used for the site directory: the bare host, without user or port.
    pub fn site_name(&self) -> &str {
        &self.host
    }
}

fn split_port<'a>(rest: &'a str, input: &str) -> Result<(&'a str, Option<u16>)> {
    // [v6-address]:port
    if let Some(bracketed) = rest.strip_prefix('[') {
        let (host, after) = bracketed.split_once(']').ok_or_else(|| {
            Error::validation_invalid_argument(
                "host",
                "Unclosed '[' in host",
                Some(input.to_string()),
            )
        })?;
        return match after {
            "" => Ok((host, None)),
            _ => match after.strip_prefix(':') {
                Some(port) => Ok((host, Some(parse_port(port, input)?))),
                None => Err(Error::validation_invalid_argument(
                    "host",
                    "Unexpected text after ']'",
                    Some(input.to_string()),
                )),
            },
        };
    }

    // A bare IPv6 address has several colons and no port.
    if rest.matches(':').count() == 1 {
        if let Some((host, port)) = rest.split_once(':') {
            return Ok((host, Some(parse_port(port, input)?)));
        }
    }

    Ok((rest, None))
}

fn parse_port(port: &str, input: &str) -> Result<u16> {
    match port.parse::<u16>() {
        Ok(p) if p > 0 => Ok(p),
        _ => Err(Error::validation_invalid_argument(
            "port",
            format!("'{}' is not a valid port", port),
            Some(input.to_string()),
        )),
    }
}

impl fmt::Display for HostSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        match (self.port, self.host.contains(':')) {
            (Some(port), true) => write!(f, "[{}]:{}", self.host, port),
            (Some(port), false) => write!(f, "{}:{}", self.host, port),
            (None, _) => write!(f, "{}", self.host),
        }
    }
}
