//! Action catalog: named mutators applied to the descriptor builder.
//!
//! Every action first asserts its fixed argument arity, then coerces and
//! validates each literal before touching the builder. A single failure
//! aborts the whole build; no partial descriptor escapes.
//!
//! Like the trigger catalog, action names are enforced by serde enum renames,
//! so unknown names in a rule-set document die at parse time.

use chrono::{DateTime, Duration, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::builder::DescriptorBuilder;
use crate::descriptor::{OAuthTransport, SignatureMethod};
use crate::error::{Error, Result};
use crate::intent::{Method, Pair, PairValue};

/// Longest accepted literal argument.
const VALUE_MAX: usize = 5000;

/// A named mutation applied to a descriptor builder, with literal arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "set authorization")]
    SetAuthorization,
    #[serde(rename = "set authorization send immediately")]
    SetAuthorizationSendImmediately,
    #[serde(rename = "set authorization bearer")]
    SetAuthorizationBearer,
    #[serde(rename = "set OAuth")]
    SetOAuth,
    /// Historical wire name; configures the RSA-SHA1 signing flow.
    #[serde(rename = "set OAuth HMAC-SHA1")]
    SetOAuthRsa,
    #[serde(rename = "set OAuth body hash")]
    SetOAuthBodyHash,
    #[serde(rename = "set OAuth transport method")]
    SetOAuthTransportMethod,
    #[serde(rename = "set SSL client")]
    SetSslClient,
    #[serde(rename = "set SSL client PFX")]
    SetSslClientPfx,
    #[serde(rename = "set SSL Certificate Authority")]
    SetSslCertificateAuthority,
    #[serde(rename = "set SSL security options")]
    SetSslSecurityOptions,
    #[serde(rename = "set SSL secure protocol")]
    SetSslSecureProtocol,
    #[serde(rename = "set AWS")]
    SetAws,
    #[serde(rename = "set AWS bucket")]
    SetAwsBucket,
    #[serde(rename = "set request parameter")]
    SetRequestParameter,
    #[serde(rename = "set request parameter as integer")]
    SetRequestParameterAsInteger,
    #[serde(rename = "set request parameter as past date time")]
    SetRequestParameterAsPastDateTime,
    #[serde(rename = "set request parameter as date time starting of")]
    SetRequestParameterAsDateTimeStartingOf,
    #[serde(rename = "set header parameter")]
    SetHeaderParameter,
    #[serde(rename = "set header parameter as integer")]
    SetHeaderParameterAsInteger,
    #[serde(rename = "set header parameter as past date time")]
    SetHeaderParameterAsPastDateTime,
    #[serde(rename = "set header parameter as date time starting of")]
    SetHeaderParameterAsDateTimeStartingOf,
    #[serde(rename = "set proxy")]
    SetProxy,
    #[serde(rename = "set encoding")]
    SetEncoding,
    #[serde(rename = "set method")]
    SetMethod,
    #[serde(rename = "set follow redirect")]
    SetFollowRedirect,
    #[serde(rename = "set GZIP")]
    SetGzip,
    #[serde(rename = "set jar")]
    SetJar,
    #[serde(rename = "set strict SSL")]
    SetStrictSsl,
    #[serde(rename = "set time")]
    SetTime,
    #[serde(rename = "set timeout in ms")]
    SetTimeoutMs,
    #[serde(rename = "replace start")]
    ReplaceStart,
    #[serde(rename = "replace all")]
    ReplaceAll,
    #[serde(rename = "set custom")]
    SetCustom,
}

impl Action {
    /// Every action in the catalog, in a stable order.
    pub const ALL: &'static [Action] = &[
        Action::SetAuthorization,
        Action::SetAuthorizationSendImmediately,
        Action::SetAuthorizationBearer,
        Action::SetOAuth,
        Action::SetOAuthRsa,
        Action::SetOAuthBodyHash,
        Action::SetOAuthTransportMethod,
        Action::SetSslClient,
        Action::SetSslClientPfx,
        Action::SetSslCertificateAuthority,
        Action::SetSslSecurityOptions,
        Action::SetSslSecureProtocol,
        Action::SetAws,
        Action::SetAwsBucket,
        Action::SetRequestParameter,
        Action::SetRequestParameterAsInteger,
        Action::SetRequestParameterAsPastDateTime,
        Action::SetRequestParameterAsDateTimeStartingOf,
        Action::SetHeaderParameter,
        Action::SetHeaderParameterAsInteger,
        Action::SetHeaderParameterAsPastDateTime,
        Action::SetHeaderParameterAsDateTimeStartingOf,
        Action::SetProxy,
        Action::SetEncoding,
        Action::SetMethod,
        Action::SetFollowRedirect,
        Action::SetGzip,
        Action::SetJar,
        Action::SetStrictSsl,
        Action::SetTime,
        Action::SetTimeoutMs,
        Action::ReplaceStart,
        Action::ReplaceAll,
        Action::SetCustom,
    ];

    /// Wire name of the action.
    pub fn name(&self) -> &'static str {
        match self {
            Action::SetAuthorization => "set authorization",
            Action::SetAuthorizationSendImmediately => "set authorization send immediately",
            Action::SetAuthorizationBearer => "set authorization bearer",
            Action::SetOAuth => "set OAuth",
            Action::SetOAuthRsa => "set OAuth HMAC-SHA1",
            Action::SetOAuthBodyHash => "set OAuth body hash",
            Action::SetOAuthTransportMethod => "set OAuth transport method",
            Action::SetSslClient => "set SSL client",
            Action::SetSslClientPfx => "set SSL client PFX",
            Action::SetSslCertificateAuthority => "set SSL Certificate Authority",
            Action::SetSslSecurityOptions => "set SSL security options",
            Action::SetSslSecureProtocol => "set SSL secure protocol",
            Action::SetAws => "set AWS",
            Action::SetAwsBucket => "set AWS bucket",
            Action::SetRequestParameter => "set request parameter",
            Action::SetRequestParameterAsInteger => "set request parameter as integer",
            Action::SetRequestParameterAsPastDateTime => "set request parameter as past date time",
            Action::SetRequestParameterAsDateTimeStartingOf => {
                "set request parameter as date time starting of"
            }
            Action::SetHeaderParameter => "set header parameter",
            Action::SetHeaderParameterAsInteger => "set header parameter as integer",
            Action::SetHeaderParameterAsPastDateTime => "set header parameter as past date time",
            Action::SetHeaderParameterAsDateTimeStartingOf => {
                "set header parameter as date time starting of"
            }
            Action::SetProxy => "set proxy",
            Action::SetEncoding => "set encoding",
            Action::SetMethod => "set method",
            Action::SetFollowRedirect => "set follow redirect",
            Action::SetGzip => "set GZIP",
            Action::SetJar => "set jar",
            Action::SetStrictSsl => "set strict SSL",
            Action::SetTime => "set time",
            Action::SetTimeoutMs => "set timeout in ms",
            Action::ReplaceStart => "replace start",
            Action::ReplaceAll => "replace all",
            Action::SetCustom => "set custom",
        }
    }

    /// Apply the action against the shared builder.
    pub fn apply(&self, builder: &mut DescriptorBuilder, values: &[String]) -> Result<()> {
        let name = self.name();
        match self {
            Action::SetAuthorization => {
                expect_arity(name, values, 2)?;
                builder.auth.user = Some(string_arg(name, values, 0)?.to_string());
                builder.auth.pass = Some(string_arg(name, values, 1)?.to_string());
            }
            Action::SetAuthorizationSendImmediately => {
                expect_arity(name, values, 1)?;
                builder.auth.send_immediately = Some(bool_arg(name, values, 0)?);
            }
            Action::SetAuthorizationBearer => {
                expect_arity(name, values, 1)?;
                builder.auth.bearer = Some(string_arg(name, values, 0)?.to_string());
            }
            Action::SetOAuth => {
                expect_arity(name, values, 4)?;
                builder.oauth.consumer_key = Some(string_arg(name, values, 0)?.to_string());
                builder.oauth.consumer_secret = Some(string_arg(name, values, 1)?.to_string());
                builder.oauth.token = Some(string_arg(name, values, 2)?.to_string());
                builder.oauth.token_secret = Some(string_arg(name, values, 3)?.to_string());
            }
            Action::SetOAuthRsa => {
                expect_arity(name, values, 4)?;
                builder.oauth.consumer_key = Some(string_arg(name, values, 0)?.to_string());
                builder.oauth.private_key = Some(string_arg(name, values, 1)?.to_string());
                builder.oauth.token = Some(string_arg(name, values, 2)?.to_string());
                builder.oauth.token_secret = Some(string_arg(name, values, 3)?.to_string());
                builder.oauth.signature_method = Some(SignatureMethod::RsaSha1);
            }
            Action::SetOAuthBodyHash => {
                expect_arity(name, values, 1)?;
                builder.oauth.body_hash = Some(bool_arg(name, values, 0)?);
            }
            Action::SetOAuthTransportMethod => {
                expect_arity(name, values, 1)?;
                let raw = string_arg(name, values, 0)?;
                builder.oauth.transport_method = Some(OAuthTransport::parse(raw).ok_or_else(
                    || {
                        Error::argument(
                            name,
                            format!("'{}' is not one of query, body, header", raw),
                        )
                    },
                )?);
            }
            Action::SetSslClient => {
                expect_arity(name, values, 3)?;
                builder.agent_options.cert_path = Some(string_arg(name, values, 0)?.to_string());
                builder.agent_options.key_path = Some(string_arg(name, values, 1)?.to_string());
                builder.agent_options.passphrase = Some(string_arg(name, values, 2)?.to_string());
            }
            Action::SetSslClientPfx => {
                expect_arity(name, values, 2)?;
                builder.agent_options.pfx_path = Some(string_arg(name, values, 0)?.to_string());
                builder.agent_options.passphrase = Some(string_arg(name, values, 1)?.to_string());
            }
            Action::SetSslCertificateAuthority => {
                expect_arity(name, values, 1)?;
                builder.agent_options.ca_path = Some(string_arg(name, values, 0)?.to_string());
            }
            Action::SetSslSecurityOptions => {
                expect_arity(name, values, 1)?;
                builder.agent_options.security_options =
                    Some(enum_arg(name, values, 0, &["SSL_OP_NO_SSLv3"])?.to_string());
            }
            Action::SetSslSecureProtocol => {
                expect_arity(name, values, 1)?;
                builder.agent_options.secure_protocol =
                    Some(enum_arg(name, values, 0, &["SSLv3_method"])?.to_string());
            }
            Action::SetAws => {
                expect_arity(name, values, 2)?;
                builder.aws.key = Some(string_arg(name, values, 0)?.to_string());
                builder.aws.secret = Some(string_arg(name, values, 1)?.to_string());
            }
            Action::SetAwsBucket => {
                expect_arity(name, values, 1)?;
                builder.aws.bucket = Some(string_arg(name, values, 0)?.to_string());
            }
            Action::SetRequestParameter => {
                push_pair(name, &mut builder.parameter_list, values)?;
            }
            Action::SetRequestParameterAsInteger => {
                push_pair_as_integer(name, &mut builder.parameter_list, values)?;
            }
            Action::SetRequestParameterAsPastDateTime => {
                push_pair_as_past_date_time(name, &mut builder.parameter_list, values)?;
            }
            Action::SetRequestParameterAsDateTimeStartingOf => {
                push_pair_starting_of(name, &mut builder.parameter_list, values)?;
            }
            Action::SetHeaderParameter => {
                push_pair(name, &mut builder.header_list, values)?;
            }
            Action::SetHeaderParameterAsInteger => {
                push_pair_as_integer(name, &mut builder.header_list, values)?;
            }
            Action::SetHeaderParameterAsPastDateTime => {
                push_pair_as_past_date_time(name, &mut builder.header_list, values)?;
            }
            Action::SetHeaderParameterAsDateTimeStartingOf => {
                push_pair_starting_of(name, &mut builder.header_list, values)?;
            }
            Action::SetProxy => {
                expect_arity(name, values, 1)?;
                builder.proxy = Some(string_arg(name, values, 0)?.to_string());
            }
            Action::SetEncoding => {
                expect_arity(name, values, 1)?;
                builder.encoding = Some(string_arg(name, values, 0)?.to_string());
            }
            Action::SetMethod => {
                expect_arity(name, values, 1)?;
                let raw = string_arg(name, values, 0)?;
                builder.method = Some(Method::parse(raw).ok_or_else(|| {
                    Error::argument(name, format!("'{}' is not a supported HTTP method", raw))
                })?);
            }
            Action::SetFollowRedirect => {
                expect_arity(name, values, 1)?;
                builder.follow_redirect = Some(bool_arg(name, values, 0)?);
            }
            Action::SetGzip => {
                expect_arity(name, values, 1)?;
                builder.gzip = Some(bool_arg(name, values, 0)?);
            }
            Action::SetJar => {
                expect_arity(name, values, 1)?;
                builder.jar = Some(bool_arg(name, values, 0)?);
            }
            Action::SetStrictSsl => {
                expect_arity(name, values, 1)?;
                builder.strict_ssl = Some(bool_arg(name, values, 0)?);
            }
            Action::SetTime => {
                expect_arity(name, values, 1)?;
                builder.time = Some(bool_arg(name, values, 0)?);
            }
            Action::SetTimeoutMs => {
                expect_arity(name, values, 1)?;
                builder.timeout = Some(int_arg(name, values, 0)?);
            }
            Action::ReplaceStart => {
                expect_arity(name, values, 2)?;
                let search = string_arg(name, values, 0)?;
                let replacement = string_arg(name, values, 1)?;
                // Absent prefix: the strip is a no-op and the replacement is
                // still prepended.
                let rest = builder.uri.strip_prefix(search).unwrap_or(&builder.uri);
                builder.uri = format!("{}{}", replacement, rest);
            }
            Action::ReplaceAll => {
                expect_arity(name, values, 2)?;
                let search = string_arg(name, values, 0)?;
                let replacement = string_arg(name, values, 1)?;
                builder.uri = builder.uri.replace(search, replacement);
            }
            Action::SetCustom => {
                expect_arity(name, values, 2)?;
                let key = string_arg(name, values, 0)?.to_string();
                let value = string_arg(name, values, 1)?.to_string();
                builder.custom.insert(key, value);
            }
        }
        Ok(())
    }
}

/// Time units accepted by the date-time parameter actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimeUnit {
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    fn parse(s: &str) -> Option<TimeUnit> {
        match s {
            "days" => Some(TimeUnit::Days),
            "hours" => Some(TimeUnit::Hours),
            "minutes" => Some(TimeUnit::Minutes),
            "seconds" => Some(TimeUnit::Seconds),
            _ => None,
        }
    }

    /// `None` when the amount overflows chrono's duration range.
    fn duration(&self, amount: i64) -> Option<Duration> {
        match self {
            TimeUnit::Days => Duration::try_days(amount),
            TimeUnit::Hours => Duration::try_hours(amount),
            TimeUnit::Minutes => Duration::try_minutes(amount),
            TimeUnit::Seconds => Duration::try_seconds(amount),
        }
    }

    /// Floor a timestamp to the start of this unit.
    fn floor(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let seconds = now.with_nanosecond(0)?;
        match self {
            TimeUnit::Seconds => Some(seconds),
            TimeUnit::Minutes => seconds.with_second(0),
            TimeUnit::Hours => seconds.with_second(0)?.with_minute(0),
            TimeUnit::Days => seconds.with_second(0)?.with_minute(0)?.with_hour(0),
        }
    }
}

// ---------------------------------------------------------------------------
// Argument coercion
// ---------------------------------------------------------------------------

fn expect_arity(action: &'static str, values: &[String], arity: usize) -> Result<()> {
    if values.len() != arity {
        return Err(Error::argument(
            action,
            format!("expected {} argument(s), got {}", arity, values.len()),
        ));
    }
    Ok(())
}

fn string_arg<'a>(action: &'static str, values: &'a [String], idx: usize) -> Result<&'a str> {
    let value = values[idx].as_str();
    let len = value.chars().count();
    if len == 0 || len > VALUE_MAX {
        return Err(Error::argument(
            action,
            format!("argument {} must be 1-{} characters", idx + 1, VALUE_MAX),
        ));
    }
    Ok(value)
}

fn int_arg(action: &'static str, values: &[String], idx: usize) -> Result<i64> {
    let raw = string_arg(action, values, idx)?;
    raw.parse::<i64>().map_err(|_| {
        Error::argument(
            action,
            format!("argument {} ('{}') is not an integer", idx + 1, raw),
        )
    })
}

/// Fixed case-insensitive boolean vocabulary; everything else is rejected.
fn bool_arg(action: &'static str, values: &[String], idx: usize) -> Result<bool> {
    let raw = string_arg(action, values, idx)?;
    match raw.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" => Ok(true),
        "false" | "no" | "off" => Ok(false),
        _ => Err(Error::argument(
            action,
            format!("argument {} ('{}') is not a boolean", idx + 1, raw),
        )),
    }
}

fn enum_arg<'a>(
    action: &'static str,
    values: &'a [String],
    idx: usize,
    allowed: &[&str],
) -> Result<&'a str> {
    let raw = string_arg(action, values, idx)?;
    if allowed.contains(&raw) {
        Ok(raw)
    } else {
        Err(Error::argument(
            action,
            format!(
                "argument {} ('{}') must be one of: {}",
                idx + 1,
                raw,
                allowed.join(", ")
            ),
        ))
    }
}

fn unit_arg(action: &'static str, values: &[String], idx: usize) -> Result<TimeUnit> {
    let raw = string_arg(action, values, idx)?;
    TimeUnit::parse(raw).ok_or_else(|| {
        Error::argument(
            action,
            format!(
                "argument {} ('{}') must be one of: days, hours, minutes, seconds",
                idx + 1,
                raw
            ),
        )
    })
}

// ---------------------------------------------------------------------------
// Parameter-family helpers
// ---------------------------------------------------------------------------

fn push_pair(action: &'static str, list: &mut Vec<Pair>, values: &[String]) -> Result<()> {
    expect_arity(action, values, 2)?;
    let k = string_arg(action, values, 0)?.to_string();
    let v = string_arg(action, values, 1)?.to_string();
    list.push(Pair {
        k,
        v: PairValue::Text(v),
    });
    Ok(())
}

fn push_pair_as_integer(
    action: &'static str,
    list: &mut Vec<Pair>,
    values: &[String],
) -> Result<()> {
    expect_arity(action, values, 2)?;
    let k = string_arg(action, values, 0)?.to_string();
    let v = int_arg(action, values, 1)?;
    list.push(Pair {
        k,
        v: PairValue::Int(v),
    });
    Ok(())
}

/// `[key, amount, unit, pattern]` — value is `now − amount·unit`, formatted
/// with the caller's chrono pattern. Wall-clock dependent.
fn push_pair_as_past_date_time(
    action: &'static str,
    list: &mut Vec<Pair>,
    values: &[String],
) -> Result<()> {
    expect_arity(action, values, 4)?;
    let k = string_arg(action, values, 0)?.to_string();
    let amount = int_arg(action, values, 1)?;
    let unit = unit_arg(action, values, 2)?;
    let pattern = string_arg(action, values, 3)?;

    let delta = unit.duration(amount).ok_or_else(|| {
        Error::argument(action, format!("amount {} is out of range", amount))
    })?;
    let since = Local::now().checked_sub_signed(delta).ok_or_else(|| {
        Error::argument(action, format!("amount {} is out of range", amount))
    })?;
    list.push(Pair {
        k,
        v: PairValue::Text(format_timestamp(action, since, pattern)?),
    });
    Ok(())
}

/// `[key, unit, pattern]` — value is `now` floored to the start of the unit,
/// formatted with the caller's chrono pattern. Wall-clock dependent.
fn push_pair_starting_of(
    action: &'static str,
    list: &mut Vec<Pair>,
    values: &[String],
) -> Result<()> {
    expect_arity(action, values, 3)?;
    let k = string_arg(action, values, 0)?.to_string();
    let unit = unit_arg(action, values, 1)?;
    let pattern = string_arg(action, values, 2)?;

    let since = unit.floor(Local::now()).ok_or_else(|| {
        Error::argument(action, "could not floor the current timestamp".to_string())
    })?;
    list.push(Pair {
        k,
        v: PairValue::Text(format_timestamp(action, since, pattern)?),
    });
    Ok(())
}

/// Format through `write!` so a bad pattern surfaces as an error instead of a
/// panic.
fn format_timestamp(
    action: &'static str,
    ts: DateTime<Local>,
    pattern: &str,
) -> Result<String> {
    use std::fmt::Write as _;
    let mut out = String::new();
    write!(out, "{}", ts.format(pattern)).map_err(|_| {
        Error::argument(action, format!("invalid date-time pattern '{}'", pattern))
    })?;
    Ok(out)
}
