use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Days,
  NaiveDate,
  NaiveDateTime,
  NaiveTime,
  TimeDelta,
  TimeZone,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

/// A calendar day as seen from one timezone. Decides whether a due date
/// counts as "today".
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub struct ProjectDay {
  date: NaiveDate,
  tz:   Tz
}

impl ProjectDay {
  #[must_use]
  pub fn of(
    now: DateTime<Utc>,
    tz: Tz
  ) -> Self {
    Self {
      date: now
        .with_timezone(&tz)
        .date_naive(),
      tz
    }
  }

  pub fn date(&self) -> NaiveDate {
    self.date
  }

  pub fn timezone(&self) -> Tz {
    self.tz
  }

  /// Local calendar date of `dt`.
  pub fn date_of(
    &self,
    dt: DateTime<Utc>
  ) -> NaiveDate {
    dt.with_timezone(&self.tz)
      .date_naive()
  }

  pub fn contains(
    &self,
    dt: DateTime<Utc>
  ) -> bool {
    self.date_of(dt) == self.date
  }

  pub fn format(
    &self,
    dt: DateTime<Utc>
  ) -> String {
    dt.with_timezone(&self.tz)
      .format("%Y-%m-%d")
      .to_string()
  }
}

/// IANA zone name such as `Europe/Lisbon` or `UTC`.
pub fn parse_timezone(
  raw: &str
) -> anyhow::Result<Tz> {
  let name = raw.trim();
  name.parse::<Tz>().map_err(|err| {
    anyhow!(
      "unknown timezone {name:?}: {err}"
    )
  })
}

fn from_local(
  tz: Tz,
  naive: NaiveDateTime
) -> anyhow::Result<DateTime<Utc>> {
  // Ambiguous wall times (DST fall-back) take the earlier instant.
  tz.from_local_datetime(&naive)
    .earliest()
    .map(|dt| dt.with_timezone(&Utc))
    .ok_or_else(|| {
      anyhow!(
        "{naive} does not exist in {tz}"
      )
    })
}

fn start_of(
  date: NaiveDate,
  tz: Tz
) -> anyhow::Result<DateTime<Utc>> {
  from_local(
    tz,
    date.and_time(NaiveTime::MIN)
  )
}

fn shift_days(
  date: NaiveDate,
  days: i64
) -> anyhow::Result<NaiveDate> {
  let step = Days::new(days.unsigned_abs());
  let shifted = if days < 0 {
    date.checked_sub_days(step)
  } else {
    date.checked_add_days(step)
  };
  shifted.ok_or_else(|| {
    anyhow!("date out of range: {date} {days:+}d")
  })
}

fn next_weekday(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let ahead = (7
    + target.num_days_from_monday()
    - from.weekday().num_days_from_monday())
    % 7;
  let ahead = if ahead == 0 { 7 } else { ahead };
  from
    .checked_add_days(Days::new(
      u64::from(ahead)
    ))
    .unwrap_or(from)
}

fn relative_offset(
  token: &str
) -> anyhow::Result<Option<TimeDelta>> {
  let re =
    Regex::new(r"^([+-])(\d+)([dhm])$")
      .context("relative date pattern")?;
  let Some(caps) = re.captures(token)
  else {
    return Ok(None);
  };

  let amount: i64 =
    caps[2].parse().with_context(|| {
      format!("offset too large: {token}")
    })?;
  let amount = if &caps[1] == "-" {
    -amount
  } else {
    amount
  };
  let offset = match &caps[3] {
    | "d" => TimeDelta::try_days(amount),
    | "h" => TimeDelta::try_hours(amount),
    | _ => TimeDelta::try_minutes(amount)
  };
  offset
    .map(Some)
    .ok_or_else(|| {
      anyhow!("offset too large: {token}")
    })
}

/// Parses a due-date expression relative to `now`; day words and bare
/// dates resolve to local midnight in `tz`.
#[tracing::instrument(skip(now, tz), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  now: DateTime<Utc>,
  tz: Tz
) -> anyhow::Result<DateTime<Utc>> {
  let token = input.trim();
  let lower = token.to_ascii_lowercase();
  let today = ProjectDay::of(now, tz).date();

  let day_offset = match lower.as_str() {
    | "now" => return Ok(now),
    | "today" => Some(0),
    | "tomorrow" => Some(1),
    | "yesterday" => Some(-1),
    | _ => None
  };
  if let Some(days) = day_offset {
    return start_of(
      shift_days(today, days)?,
      tz
    );
  }

  if let Ok(weekday) =
    lower.parse::<Weekday>()
  {
    return start_of(
      next_weekday(today, weekday),
      tz
    );
  }

  if let Some(offset) =
    relative_offset(token)?
  {
    return now
      .checked_add_signed(offset)
      .ok_or_else(|| {
        anyhow!("date out of range: {input}")
      });
  }

  if let Ok(dt) =
    DateTime::parse_from_rfc3339(token)
  {
    return Ok(dt.with_timezone(&Utc));
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return start_of(date, tz);
  }

  for fmt in
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
  {
    if let Ok(naive) =
      NaiveDateTime::parse_from_str(
        token, fmt
      )
    {
      return from_local(tz, naive);
    }
  }

  Err(anyhow!(
    "unrecognized date expression: \
     {input}"
  ))
  .context(
    "supported formats: \
     now/today/tomorrow/yesterday, \
     weekday names (e.g. monday), \
     +Nd/+Nh/+Nm, RFC3339, \
     YYYY-MM-DD, YYYY-MM-DDTHH:MM, \
     YYYY-MM-DD HH:MM"
  )
}
