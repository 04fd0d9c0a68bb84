/*
[INPUT]:  Challenge fields or the canonical EIP-4361 text
[OUTPUT]: Immutable Challenge values and the exact text a wallet signs
[POS]:    Challenge layer - message model and text codec
[UPDATE]: When the signed message format gains or loses fields
*/

use std::fmt;
use std::str::FromStr;

use alloy_primitives::Address;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::SIWE_VERSION;
use crate::error::{AuthError, Result};

use super::Nonce;

const HEADER_SUFFIX: &str = " wants you to sign in with your Ethereum account:";
pub(crate) const URI_TAG: &str = "URI: ";
const VERSION_TAG: &str = "Version: ";
const CHAIN_ID_TAG: &str = "Chain ID: ";
const NONCE_TAG: &str = "Nonce: ";
const ISSUED_AT_TAG: &str = "Issued At: ";
const EXPIRATION_TIME_TAG: &str = "Expiration Time: ";
const NOT_BEFORE_TAG: &str = "Not Before: ";

/// Single-use sign-in message.
///
/// Built by [`ChallengeFactory`](super::ChallengeFactory) or parsed from text;
/// fields are read-only afterwards. `Display` renders the canonical text that
/// is handed to the wallet and later to the verifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub(crate) domain: String,
    pub(crate) address: String,
    pub(crate) statement: Option<String>,
    pub(crate) uri: String,
    pub(crate) version: String,
    pub(crate) chain_id: u64,
    pub(crate) nonce: Nonce,
    pub(crate) issued_at: DateTime<Utc>,
    pub(crate) expiration_time: Option<DateTime<Utc>>,
    pub(crate) not_before: Option<DateTime<Utc>>,
}

impl Challenge {
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expiration_time(&self) -> Option<DateTime<Utc>> {
        self.expiration_time
    }

    pub fn not_before(&self) -> Option<DateTime<Utc>> {
        self.not_before
    }

    /// Canonical text form, the exact bytes the wallet is asked to sign
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}{HEADER_SUFFIX}", self.domain)?;
        writeln!(f, "{}", self.address)?;
        writeln!(f)?;
        if let Some(statement) = &self.statement {
            writeln!(f, "{statement}")?;
            writeln!(f)?;
        }
        writeln!(f, "{URI_TAG}{}", self.uri)?;
        writeln!(f, "{VERSION_TAG}{}", self.version)?;
        writeln!(f, "{CHAIN_ID_TAG}{}", self.chain_id)?;
        writeln!(f, "{NONCE_TAG}{}", self.nonce)?;
        write!(f, "{ISSUED_AT_TAG}{}", format_timestamp(&self.issued_at))?;
        if let Some(expiration_time) = &self.expiration_time {
            write!(f, "\n{EXPIRATION_TIME_TAG}{}", format_timestamp(expiration_time))?;
        }
        if let Some(not_before) = &self.not_before {
            write!(f, "\n{NOT_BEFORE_TAG}{}", format_timestamp(not_before))?;
        }
        Ok(())
    }
}

impl FromStr for Challenge {
    type Err = AuthError;

    fn from_str(text: &str) -> Result<Self> {
        let mut lines = text.split('\n');

        let header = next_line(&mut lines, "header")?;
        let domain = header
            .strip_suffix(HEADER_SUFFIX)
            .filter(|domain| !domain.is_empty())
            .ok_or_else(|| invalid("missing sign-in header"))?
            .to_string();

        let address = next_line(&mut lines, "address")?.to_string();
        Address::from_str(&address).map_err(|e| invalid(format!("bad address: {e}")))?;
        expect_blank(&mut lines)?;

        let mut line = next_line(&mut lines, "URI")?;
        let statement = if line.starts_with(URI_TAG) {
            None
        } else {
            let statement = line.to_string();
            expect_blank(&mut lines)?;
            line = next_line(&mut lines, "URI")?;
            Some(statement)
        };

        let uri = tagged(line, URI_TAG)?.to_string();
        let version = tagged(next_line(&mut lines, "version")?, VERSION_TAG)?.to_string();
        if version != SIWE_VERSION {
            return Err(invalid(format!("unsupported version {version:?}")));
        }
        let chain_id = tagged(next_line(&mut lines, "chain id")?, CHAIN_ID_TAG)?
            .parse::<u64>()
            .map_err(|e| invalid(format!("bad chain id: {e}")))?;
        let nonce = Nonce::parse(tagged(next_line(&mut lines, "nonce")?, NONCE_TAG)?)?;
        let issued_at = parse_timestamp(tagged(
            next_line(&mut lines, "issued at")?,
            ISSUED_AT_TAG,
        )?)?;

        let mut expiration_time = None;
        let mut not_before = None;
        for line in lines {
            if let Some(value) = line.strip_prefix(EXPIRATION_TIME_TAG) {
                if expiration_time.is_some() || not_before.is_some() {
                    return Err(invalid("misplaced expiration time"));
                }
                expiration_time = Some(parse_timestamp(value)?);
            } else if let Some(value) = line.strip_prefix(NOT_BEFORE_TAG) {
                if not_before.is_some() {
                    return Err(invalid("duplicate not-before"));
                }
                not_before = Some(parse_timestamp(value)?);
            } else {
                return Err(invalid(format!("unexpected line {line:?}")));
            }
        }

        Ok(Self {
            domain,
            address,
            statement,
            uri,
            version,
            chain_id,
            nonce,
            issued_at,
            expiration_time,
            not_before,
        })
    }
}

pub(crate) fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| invalid(format!("bad timestamp {value:?}: {e}")))
}

fn next_line<'a>(lines: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<&'a str> {
    lines
        .next()
        .ok_or_else(|| invalid(format!("message ended before {what}")))
}

fn expect_blank<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Result<()> {
    match lines.next() {
        Some("") => Ok(()),
        _ => Err(invalid("expected blank line")),
    }
}

fn tagged<'a>(line: &'a str, tag: &str) -> Result<&'a str> {
    line.strip_prefix(tag)
        .ok_or_else(|| invalid(format!("expected {:?}", tag.trim_end())))
}

fn invalid(detail: impl Into<String>) -> AuthError {
    AuthError::InvalidMessage(detail.into())
}
