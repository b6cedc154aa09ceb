use serde::de::{Deserialize, Deserializer, Error};

/// Slack responses carry an `ok` flag that decides which shape the rest of
/// the body takes. These helpers pin the flag so that an untagged enum can
/// discriminate on it.
fn expect_ok<'a, D>(deserializer: D, expected: bool) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    let ok = bool::deserialize(deserializer)?;

    if ok == expected {
        Ok(ok)
    } else {
        Err(Error::custom(format!("expected ok: {}, found ok: {}", expected, ok)))
    }
}

pub fn only_true<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    expect_ok(deserializer, true)
}

pub fn only_false<'a, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'a>,
{
    expect_ok(deserializer, false)
}
