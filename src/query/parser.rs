use nom::bytes::complete::{tag, tag_no_case};
use nom::combinator::{all_consuming, rest};
use nom::sequence::preceded;
use nom::IResult;
use crate::query::{ChartQuery, QueryError};

/// Parse a chart query file:
///
/// ```text
/// -- drebedengi chart
/// -- Field one
/// -- Field two
///
/// SELECT ... WHERE name = ? AND date >= ? AND date < ?
/// ```
pub(crate) fn parse_query(content: &str) -> Result<ChartQuery, QueryError> {
    let content = content.replace("\r\n", "\n");
    let (header, sql) = content.split_once("\n\n")
        .ok_or_else(|| QueryError::new("no blank line between header and SQL"))?;

    let mut lines = header.split('\n').map(str::trim);
    match lines.next() {
        Some(line) if magic_line(line).is_ok() => {}
        _ => return Err(QueryError::new("first line must be '-- drebedengi chart'")),
    }

    let mut fields = vec![];
    for line in lines.filter(|l| !l.is_empty()) {
        match field_line(line) {
            Ok((_, "")) => {}
            Ok((_, field)) => fields.push(field.to_string()),
            Err(_) => return Err(QueryError::new(&format!("header line is not a comment: {}", line))),
        }
    }

    if fields.is_empty() {
        return Err(QueryError::new("no fields in header"));
    }
    if sql.trim().is_empty() {
        return Err(QueryError::new("SQL is empty"));
    }

    Ok(ChartQuery { fields, sql: sql.to_string() })
}

/// `-- drebedengi chart`, case insensitive
fn magic_line(input: &str) -> IResult<&str, &str> {
    all_consuming(tag_no_case("-- drebedengi chart"))(input)
}

/// `-- <field name>`
fn field_line(input: &str) -> IResult<&str, &str> {
    let (input, field) = preceded(tag("--"), rest)(input)?;
    Ok((input, field.trim()))
}
