use time::OffsetDateTime;

/// Current UTC time truncated to microseconds.
///
/// PostgreSQL `timestamptz` keeps microsecond precision, so truncating here
/// means a record reads back exactly as it was written.
pub fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    let micros = now.microsecond();
    now.replace_microsecond(micros).unwrap_or(now)
}
