//! `curl` command lines in both directions.
//!
//! Export renders a preset as a multi-line `curl` command. Placeholders are
//! exported as written so the command documents the preset rather than one
//! call of it, and empty headers and query values are left out just as
//! [`build`](super::build) leaves them out of a request.
//!
//! Import reads such a command back into documents: the URL minus its query
//! string and the method go to `request`, `-H` to `headers`, the URL query and
//! `-G` data to `query`, and a JSON object passed with `-d` to `body`.

use super::assembler::non_empty_pairs;
use crate::config::DEFAULT_HTTP_METHOD;
use crate::error::{Error, Result};
use crate::store::{Document, Table};

/// Multi-line `curl` invocation with `\` continuations
pub fn export_to_curl(
    request: &Document,
    headers: &Document,
    body: &Document,
    query: &Document,
) -> Result<String> {
    let url = request.get_as_string("url");
    if url.is_empty() {
        return Err(Error::MissingUrl);
    }
    let method = match request.get_as_string("method") {
        m if m.is_empty() => DEFAULT_HTTP_METHOD.to_string(),
        m => m.to_ascii_uppercase(),
    };
    let is_get = method == "GET";

    let mut parts = vec!["curl".to_string()];
    if !is_get {
        parts.push(format!("-X {method}"));
    }

    let query_pairs = non_empty_pairs(query);
    let mut final_url = url;
    if !query_pairs.is_empty() {
        if is_get {
            parts.push("-G".to_string());
            for (key, value) in &query_pairs {
                parts.push(format!(
                    "--data-urlencode '{}={}'",
                    shell_escape(key),
                    shell_escape(value)
                ));
            }
        } else {
            let encoded = query_pairs
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect::<Vec<_>>()
                .join("&");
            let separator = if final_url.contains('?') { '&' } else { '?' };
            final_url = format!("{final_url}{separator}{encoded}");
        }
    }
    parts.push(format!("'{}'", shell_escape(&final_url)));

    for (key, value) in non_empty_pairs(headers) {
        parts.push(format!("-H '{}: {}'", shell_escape(&key), shell_escape(&value)));
    }

    if !body.is_empty() {
        parts.push(format!("-d '{}'", shell_escape(&body.to_json()?)));
    }

    Ok(join_continued(&parts))
}

/// Escape for use inside single quotes
fn shell_escape(value: &str) -> String {
    value.replace('\'', r"'\''")
}

fn join_continued(parts: &[String]) -> String {
    parts
        .iter()
        .enumerate()
        .map(|(i, part)| if i == 0 { part.clone() } else { format!("  {part}") })
        .collect::<Vec<_>>()
        .join(" \\\n")
}

/// Documents read from a `curl` command. Kinds the command says nothing about
/// are empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CurlImport {
    pub request: Document,
    pub headers: Document,
    pub query: Document,
    pub body: Document,
}

/// Options whose value is skipped on import
const IGNORED_WITH_VALUE: [&str; 12] = [
    "-o",
    "--output",
    "-u",
    "--user",
    "-w",
    "--write-out",
    "-x",
    "--proxy",
    "--connect-timeout",
    "--retry",
    "--cacert",
    "--cert",
];

/// Parse a `curl` command line as typed in a shell
pub fn import_from_curl(command: &str) -> Result<CurlImport> {
    parse_curl_words(&shell_words(command)?)
}

/// Parse a `curl` command already split into words
pub fn parse_curl_words(words: &[String]) -> Result<CurlImport> {
    let invalid = |reason: &str| Error::InvalidCurl(reason.to_string());
    let mut words = words.iter().map(String::as_str);
    if words.next() != Some("curl") {
        return Err(invalid("command must start with 'curl'"));
    }

    let mut method = None;
    let mut url = None;
    let mut timeout = None;
    let mut get = false;
    let mut headers = Vec::new();
    let mut data = Vec::new();
    let mut urlencoded = Vec::new();

    while let Some(word) = words.next() {
        let mut value = || {
            words
                .next()
                .map(str::to_string)
                .ok_or_else(|| Error::InvalidCurl(format!("{word} needs a value")))
        };
        match word {
            "-X" | "--request" => method = Some(value()?),
            "-H" | "--header" => headers.push(value()?),
            "-A" | "--user-agent" => headers.push(format!("User-Agent: {}", value()?)),
            "-e" | "--referer" => headers.push(format!("Referer: {}", value()?)),
            "-b" | "--cookie" => headers.push(format!("Cookie: {}", value()?)),
            "-d" | "--data" | "--data-raw" | "--data-binary" | "--data-ascii" | "--json" => {
                data.push(value()?)
            }
            "--data-urlencode" => urlencoded.push(value()?),
            "-G" | "--get" => get = true,
            "--url" => url = Some(value()?),
            "-m" | "--max-time" => timeout = Some(value()?),
            flag if IGNORED_WITH_VALUE.contains(&flag) => {
                let skipped = value()?;
                tracing::warn!("ignoring curl option {} {}", flag, skipped);
            }
            flag if flag.starts_with("-X") && flag.len() > 2 => method = Some(flag[2..].to_string()),
            flag if flag.starts_with('-') => tracing::debug!("ignoring curl option {}", flag),
            positional if url.is_none() => url = Some(positional.to_string()),
            extra => tracing::warn!("ignoring extra argument '{}'", extra),
        }
    }

    let url = url.ok_or(Error::MissingUrl)?;
    let mut imported = CurlImport::default();

    let (base, query_string) = match url.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (url.as_str(), None),
    };
    let method = match method {
        Some(method) => method.to_ascii_uppercase(),
        None if !data.is_empty() && !get => "POST".to_string(),
        None => DEFAULT_HTTP_METHOD.to_string(),
    };
    imported.request.set("url", base);
    imported.request.set("method", method);
    if let Some(timeout) = timeout {
        imported.request.set("timeout", timeout);
    }

    for header in &headers {
        match header.split_once(':') {
            Some((name, value)) => imported.headers.insert(name.trim(), value.trim()),
            None => tracing::warn!("ignoring malformed header '{}'", header),
        }
    }

    if let Some(query_string) = query_string {
        for (key, value) in decode_query(query_string) {
            imported.query.insert(&key, value);
        }
    }

    for pair in &urlencoded {
        let (key, value) = pair.split_once('=').unwrap_or(("", pair.as_str()));
        if key.is_empty() {
            tracing::warn!("ignoring --data-urlencode '{}' without a name", pair);
            continue;
        }
        if get {
            imported.query.insert(key, value);
        } else {
            imported.body.insert(key, value);
        }
    }

    if !data.is_empty() {
        let text = data.join("&");
        if get {
            for (key, value) in decode_query(&text) {
                imported.query.insert(&key, value);
            }
        } else {
            let json: serde_json::Value = serde_json::from_str(&text)
                .map_err(|e| Error::InvalidCurl(format!("body is not JSON: {e}")))?;
            let object = json
                .as_object()
                .ok_or_else(|| invalid("only JSON object bodies can be imported"))?;
            imported.body.merge(&Document::from_table(Table::from_toml(
                toml::Table::try_from(object)?,
            )));
        }
    }

    Ok(imported)
}

/// `a=1&b=x%20y` as decoded pairs, in order
fn decode_query(text: &str) -> Vec<(String, String)> {
    let decode = |part: &str| {
        let spaced = part.replace('+', " ");
        urlencoding::decode(&spaced)
            .map(|decoded| decoded.into_owned())
            .unwrap_or(spaced)
    };
    text.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

/// Split a shell command line into words. Handles single and double quotes,
/// backslash escapes and `\` line continuations.
fn shell_words(text: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(ch) => word.push(ch),
                        None => return Err(Error::InvalidCurl("unterminated quote".to_string())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(ch @ ('"' | '\\' | '$' | '`')) => word.push(ch),
                            Some('\n') => {}
                            Some(ch) => {
                                word.push('\\');
                                word.push(ch);
                            }
                            None => {
                                return Err(Error::InvalidCurl("unterminated quote".to_string()))
                            }
                        },
                        Some(ch) => word.push(ch),
                        None => return Err(Error::InvalidCurl("unterminated quote".to_string())),
                    }
                }
            }
            '\\' => match chars.next() {
                Some('\n') => {}
                Some('\r') if chars.peek() == Some(&'\n') => {
                    chars.next();
                }
                Some(ch) => {
                    in_word = true;
                    word.push(ch);
                }
                None => {}
            },
            ch if ch.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            ch => {
                in_word = true;
                word.push(ch);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}
