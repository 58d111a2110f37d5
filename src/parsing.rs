use nom::{
    bytes::complete::take_while1,
    character::complete::{i32, space1},
    number::complete::double,
    sequence::preceded,
    IResult,
};

pub(crate) fn double_entry(line: &str) -> IResult<&str, f64> {
    preceded(space1, double)(line)
}

pub(crate) fn any_entry(line: &str) -> IResult<&str, &str> {
    preceded(space1, non_space)(line)
}

pub(crate) fn i32_entry(line: &str) -> IResult<&str, i32> {
    preceded(space1, i32)(line)
}

pub(crate) fn non_space(line: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_ascii_whitespace())(line)
}
