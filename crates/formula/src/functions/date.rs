//! Date functions. Calendar fields are read in the context's timezone.

use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::Tz;

use crate::argument::{ArgumentType, parse_timezone};
use crate::context::RuntimeFormulaContext;
use crate::error::{FormulaError, FormulaResult};
use crate::value::Value;
use crate::value::moment_format::format_datetime;

use super::{Category, Example, FormulaFunction, FunctionRegistry, text_arg};

const DATETIME: &[ArgumentType] = &[ArgumentType::datetime()];

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(DateTimeFormat);
    registry.register(CalendarField::DAY);
    registry.register(CalendarField::MONTH);
    registry.register(CalendarField::YEAR);
    registry.register(CalendarField::HOUR);
    registry.register(CalendarField::MINUTE);
    registry.register(CalendarField::SECOND);
    registry.register(Now);
    registry.register(Today);
}

fn datetime_arg(function: &str, args: &[Value], index: usize) -> FormulaResult<DateTime<Utc>> {
    match args.get(index) {
        Some(Value::DateTime(datetime)) => Ok(*datetime),
        _ => Err(FormulaError::execution(
            function,
            format!("argument {index} is not a date"),
        )),
    }
}

/// `datetime_format(date, pattern, timezone?)` using moment.js tokens.
pub struct DateTimeFormat;

impl FormulaFunction for DateTimeFormat {
    fn name(&self) -> &'static str {
        "datetime_format"
    }

    fn category(&self) -> Category {
        Category::Date
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        const ARGS: &[ArgumentType] = &[
            ArgumentType::datetime(),
            ArgumentType::text(),
            ArgumentType::timezone().optional(),
        ];
        Some(ARGS)
    }

    fn description(&self) -> &'static str {
        "Formats a date using a pattern such as 'YYYY-MM-DD HH:mm', optionally in a given timezone."
    }

    fn examples(&self) -> &'static [Example] {
        &[
            Example {
                formula: "datetime_format('2025-11-03', 'YY/MM/DD', 'UTC')",
                result: r#""25/11/03""#,
            },
            Example {
                formula: "datetime_format('2025-11-03 14:05', 'HH:mm', 'Europe/Amsterdam')",
                result: r#""15:05""#,
            },
        ]
    }

    fn execute(&self, context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let datetime = datetime_arg(self.name(), &args, 0)?;
        let pattern = text_arg(&args, 1).unwrap_or_default();
        let timezone = text_arg(&args, 2)
            .and_then(parse_timezone)
            .unwrap_or_else(|| context.timezone());

        let local = datetime.with_timezone(&timezone);
        Ok(Value::String(format_datetime(&local, pattern)))
    }
}

/// A single calendar component of a date: `day`, `month`, `year` and the clock fields.
pub struct CalendarField {
    name: &'static str,
    description: &'static str,
    examples: &'static [Example],
    extract: fn(&DateTime<Tz>) -> u32,
}

fn day_of(datetime: &DateTime<Tz>) -> u32 {
    datetime.day()
}

fn month0_of(datetime: &DateTime<Tz>) -> u32 {
    datetime.month0()
}

fn year_of(datetime: &DateTime<Tz>) -> u32 {
    // Years before the common era are not representable in formulas
    datetime.year().max(0) as u32
}

fn hour_of(datetime: &DateTime<Tz>) -> u32 {
    datetime.hour()
}

fn minute_of(datetime: &DateTime<Tz>) -> u32 {
    datetime.minute()
}

fn second_of(datetime: &DateTime<Tz>) -> u32 {
    datetime.second()
}

impl CalendarField {
    const DAY: CalendarField = CalendarField {
        name: "day",
        description: "Returns the day of the month, from 1 to 31.",
        examples: &[Example {
            formula: "day('2025-11-03')",
            result: "3",
        }],
        extract: day_of,
    };

    const MONTH: CalendarField = CalendarField {
        name: "month",
        description: "Returns the month of the year, from 0 (January) to 11 (December).",
        examples: &[Example {
            formula: "month('2025-11-03')",
            result: "10",
        }],
        extract: month0_of,
    };

    const YEAR: CalendarField = CalendarField {
        name: "year",
        description: "Returns the year of a date.",
        examples: &[Example {
            formula: "year('2025-11-03')",
            result: "2025",
        }],
        extract: year_of,
    };

    const HOUR: CalendarField = CalendarField {
        name: "hour",
        description: "Returns the hour of a date, from 0 to 23.",
        examples: &[Example {
            formula: "hour('2025-11-03 14:30:45')",
            result: "14",
        }],
        extract: hour_of,
    };

    const MINUTE: CalendarField = CalendarField {
        name: "minute",
        description: "Returns the minutes of a date, from 0 to 59.",
        examples: &[Example {
            formula: "minute('2025-11-03 14:30:45')",
            result: "30",
        }],
        extract: minute_of,
    };

    const SECOND: CalendarField = CalendarField {
        name: "second",
        description: "Returns the seconds of a date, from 0 to 59.",
        examples: &[Example {
            formula: "second('2025-11-03 14:30:45')",
            result: "45",
        }],
        extract: second_of,
    };
}

impl FormulaFunction for CalendarField {
    fn name(&self) -> &'static str {
        self.name
    }

    fn category(&self) -> Category {
        Category::Date
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(DATETIME)
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn examples(&self) -> &'static [Example] {
        self.examples
    }

    fn execute(&self, context: &RuntimeFormulaContext, args: Vec<Value>) -> FormulaResult<Value> {
        let datetime = datetime_arg(self.name, &args, 0)?.with_timezone(&context.timezone());
        Ok(Value::Number(f64::from((self.extract)(&datetime))))
    }
}

pub struct Now;

impl FormulaFunction for Now {
    fn name(&self) -> &'static str {
        "now"
    }

    fn category(&self) -> Category {
        Category::Date
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(&[])
    }

    fn description(&self) -> &'static str {
        "Returns the current date and time."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "now()",
            result: r#""2025-11-03T14:30:45.000Z""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, _args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::DateTime(Utc::now()))
    }
}

/// Today's UTC date as `YYYY-MM-DD` text.
pub struct Today;

impl FormulaFunction for Today {
    fn name(&self) -> &'static str {
        "today"
    }

    fn category(&self) -> Category {
        Category::Date
    }

    fn args(&self) -> Option<&'static [ArgumentType]> {
        Some(&[])
    }

    fn description(&self) -> &'static str {
        "Returns today's date."
    }

    fn examples(&self) -> &'static [Example] {
        &[Example {
            formula: "today()",
            result: r#""2025-11-03""#,
        }]
    }

    fn execute(&self, _context: &RuntimeFormulaContext, _args: Vec<Value>) -> FormulaResult<Value> {
        Ok(Value::String(Utc::now().format("%Y-%m-%d").to_string()))
    }
}
