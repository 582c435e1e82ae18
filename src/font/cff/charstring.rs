use std::collections::VecDeque;

use crate::{
    error::{DecodeError, DecodeResult},
    geometry::{Outline, PathBuilder},
    parse_binary::BinaryParser,
};

use super::{
    dict::escaped,
    index::CffIndex,
    number::{parse_operand, OperandContext},
};

/// The Type 2 argument stack limit
const MAX_STACK_DEPTH: usize = 48;

const TRANSIENT_ARRAY_LEN: usize = 32;

const RANDOM_SEED: u32 = 0x2545_f491;

/// Bounds on the work a single glyph may do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharstringLimits {
    /// Maximum nesting of `callsubr`/`callgsubr`
    pub max_call_depth: usize,

    /// Maximum number of operators executed for one glyph, including those
    /// executed inside subroutines
    pub max_operators: usize,
}

impl Default for CharstringLimits {
    fn default() -> Self {
        Self {
            max_call_depth: 64,
            max_operators: 1 << 20,
        }
    }
}

/// Font-level data a charstring may refer to
#[derive(Debug, Clone, Copy)]
pub(crate) struct CharstringContext<'a> {
    pub global_subrs: &'a CffIndex<'a>,
    pub local_subrs: &'a CffIndex<'a>,
    pub default_width_x: f32,
    pub nominal_width_x: f32,
    pub limits: CharstringLimits,
}

/// Accented character composition requested by `endchar`
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Seac {
    pub adx: f32,
    pub ady: f32,
    /// Standard Encoding code of the base character
    pub base: u8,
    /// Standard Encoding code of the accent character
    pub accent: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CharstringOutput {
    pub outline: Outline,
    pub width: f32,
    pub seac: Option<Seac>,
}

/// How execution of a charstring (or subroutine) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Return,
    EndChar,
    Exhausted,
}

/// The bias added to subroutine numbers before indexing into a subroutine
/// INDEX with `count` entries. Numbers are stored biased downwards, so with
/// fewer than 1240 subroutines the operand -107 calls subroutine 0.
pub fn subroutine_bias(count: usize) -> i32 {
    if count < 1240 {
        107
    } else if count < 33900 {
        1131
    } else {
        32768
    }
}

pub(crate) struct CffCharStringInterpreter<'a> {
    buffer: &'a [u8],
    cursor: usize,
    context: CharstringContext<'a>,
    operand_stack: VecDeque<f32>,
    transient_array: [f32; TRANSIENT_ARRAY_LEN],
    path_builder: PathBuilder,
    width: Option<f32>,
    first_stack_clearing_op: bool,
    stem_count: usize,
    call_depth: usize,
    operator_count: usize,
    random_state: u32,
    seac: Option<Seac>,
}

impl<'a> CffCharStringInterpreter<'a> {
    pub fn new(charstring: &'a [u8], context: CharstringContext<'a>) -> Self {
        Self {
            buffer: charstring,
            cursor: 0,
            context,
            operand_stack: VecDeque::new(),
            transient_array: [0.0; TRANSIENT_ARRAY_LEN],
            path_builder: PathBuilder::new(),
            width: None,
            first_stack_clearing_op: true,
            stem_count: 0,
            call_depth: 0,
            operator_count: 0,
            random_state: RANDOM_SEED,
            seac: None,
        }
    }

    /// Run the charstring to completion
    ///
    /// The outline drawn so far is always returned. If execution stopped
    /// early, the error is returned alongside it.
    pub fn evaluate(mut self) -> (CharstringOutput, Option<DecodeError>) {
        let error = self.execute().err();

        let output = CharstringOutput {
            outline: self.path_builder.finish(),
            width: self.width.unwrap_or(self.context.default_width_x),
            seac: self.seac,
        };

        (output, error)
    }

    fn execute(&mut self) -> DecodeResult<Flow> {
        loop {
            if self.at_end() {
                return Ok(Flow::Exhausted);
            }

            let b0 = self.next()?;

            if b0 == 28 || b0 >= 32 {
                let n = parse_operand(self, b0, OperandContext::Charstring)?;
                self.push(n as f32)?;
                continue;
            }

            self.operator_count += 1;
            if self.operator_count > self.context.limits.max_operators {
                return Err(DecodeError::OperationLimitExceeded);
            }

            let operator = if b0 == 12 {
                escaped(self.next()?)
            } else {
                b0 as u16
            };

            log::trace!(
                "charstring operator {} with {} operands at depth {}",
                operator,
                self.operand_stack.len(),
                self.call_depth
            );

            match operator {
                // y dy {dya dyb}* hstem (1)
                // x dx {dxa dxb}* vstem (3)
                // y dy {dya dyb}* hstemhm (18)
                // x dx {dxa dxb}* vstemhm (23)
                1 | 3 | 18 | 23 => self.stem()?,
                // dy1 vmoveto (4)
                4 => self.vmoveto()?,
                // {dxa dya}+ rlineto (5)
                5 => self.rlineto()?,
                // dx1 {dya dxb}* hlineto (6)
                // {dxa dyb}+ hlineto (6)
                6 => self.alternating_lines(true)?,
                // dy1 {dxa dyb}* vlineto (7)
                // {dya dxb}+ vlineto (7)
                7 => self.alternating_lines(false)?,
                // {dxa dya dxb dyb dxc dyc}+ rrcurveto (8)
                8 => self.rrcurveto()?,
                // subr# callsubr (10)
                10 => {
                    if self.call_subroutine(false)? == Flow::EndChar {
                        return Ok(Flow::EndChar);
                    }
                }
                // return (11)
                11 => {
                    if self.call_depth == 0 {
                        return Err(DecodeError::UnexpectedReturn);
                    }

                    return Ok(Flow::Return);
                }
                // endchar (14)
                14 => {
                    self.end_char()?;
                    return Ok(Flow::EndChar);
                }
                // hintmask (19 + mask)
                // cntrmask (20 + mask)
                19 | 20 => self.mask()?,
                // dx1 dy1 rmoveto (21)
                21 => self.rmoveto()?,
                // dx1 hmoveto (22)
                22 => self.hmoveto()?,
                // {dxa dya dxb dyb dxc dyc}+ dxd dyd rcurveline (24)
                24 => self.rcurveline()?,
                // {dxa dya}+ dxb dyb dxc dyc dxd dyd rlinecurve (25)
                25 => self.rlinecurve()?,
                // dx1? {dya dxb dyb dyc}+ vvcurveto (26)
                26 => self.vvcurveto()?,
                // dy1? {dxa dxb dyb dxc}+ hhcurveto (27)
                27 => self.hhcurveto()?,
                // globalsubr# callgsubr (29)
                29 => {
                    if self.call_subroutine(true)? == Flow::EndChar {
                        return Ok(Flow::EndChar);
                    }
                }
                // dy1 dx2 dy2 dx3 {dxa dxb dyb dyc dyd dxe dye dxf}* dyf? vhcurveto (30)
                // {dya dxb dyb dxc dxd dxe dye dyf}+ dxf? vhcurveto (30)
                30 => self.alternating_curves(false)?,
                // dx1 dx2 dy2 dy3 {dya dxb dyb dxc dxd dxe dye dyf}* dxf? hvcurveto (31)
                // {dxa dxb dyb dyc dyd dxe dye dxf}+ dyf? hvcurveto (31)
                31 => self.alternating_curves(true)?,
                op if op >= 1200 => self.escaped_operator(op)?,
                operator => return Err(DecodeError::UnsupportedCharstringOperator { operator }),
            }
        }
    }

    fn escaped_operator(&mut self, operator: u16) -> DecodeResult<()> {
        match operator - 1200 {
            // num1 num2 and (12 3) 1_or_0
            3 => {
                let (a, b) = self.pop_pair()?;
                self.push_bool(a != 0.0 && b != 0.0)?;
            }
            // num1 num2 or (12 4) 1_or_0
            4 => {
                let (a, b) = self.pop_pair()?;
                self.push_bool(a != 0.0 || b != 0.0)?;
            }
            // num1 not (12 5) 1_or_0
            5 => {
                let a = self.pop()?;
                self.push_bool(a == 0.0)?;
            }
            // num abs (12 9) num2
            9 => {
                let a = self.pop()?;
                self.push(a.abs())?;
            }
            // num1 num2 add (12 10) sum
            10 => {
                let (a, b) = self.pop_pair()?;
                self.push(a + b)?;
            }
            // num1 num2 sub (12 11) difference
            11 => {
                let (a, b) = self.pop_pair()?;
                self.push(a - b)?;
            }
            // num1 num2 div (12 12) quotient
            12 => {
                let (a, b) = self.pop_pair()?;
                if b == 0.0 {
                    return Err(DecodeError::DivisionByZero);
                }
                self.push(a / b)?;
            }
            // num neg (12 14) num2
            14 => {
                let a = self.pop()?;
                self.push(-a)?;
            }
            // num1 num2 eq (12 15) 1_or_0
            15 => {
                let (a, b) = self.pop_pair()?;
                self.push_bool(a == b)?;
            }
            // num drop (12 18)
            18 => {
                self.pop()?;
            }
            // val i put (12 20)
            20 => {
                let i = self.pop()?;
                let val = self.pop()?;
                let slot = self.transient_index(i)?;
                self.transient_array[slot] = val;
            }
            // i get (12 21) val
            21 => {
                let i = self.pop()?;
                let slot = self.transient_index(i)?;
                self.push(self.transient_array[slot])?;
            }
            // s1 s2 v1 v2 ifelse (12 22) s1_or_s2
            22 => {
                let v2 = self.pop()?;
                let v1 = self.pop()?;
                let s2 = self.pop()?;
                let s1 = self.pop()?;
                self.push(if v1 <= v2 { s1 } else { s2 })?;
            }
            // random (12 23) num2
            23 => {
                let n = self.random();
                self.push(n)?;
            }
            // num1 num2 mul (12 24) product
            24 => {
                let (a, b) = self.pop_pair()?;
                self.push(a * b)?;
            }
            // num sqrt (12 26) num2
            26 => {
                let a = self.pop()?;
                if a < 0.0 {
                    return Err(DecodeError::InvalidOperand);
                }
                self.push(a.sqrt())?;
            }
            // any dup (12 27) any any
            27 => {
                let a = self.pop()?;
                self.push(a)?;
                self.push(a)?;
            }
            // num1 num2 exch (12 28) num2 num1
            28 => {
                let (a, b) = self.pop_pair()?;
                self.push(b)?;
                self.push(a)?;
            }
            // numX ... num0 i index (12 29) numX ... num0 numi
            29 => self.index()?,
            // num(N–1) ... num0 N J roll (12 30) num((J–1) mod N) ... num0 num(N–1) ... num(J mod N)
            30 => self.roll()?,
            // dx1 dx2 dy2 dx3 dx4 dx5 dx6 hflex (12 34)
            34 => self.hflex()?,
            // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 dx6 dy6 fd flex (12 35)
            35 => self.flex()?,
            // dx1 dy1 dx2 dy2 dx3 dx4 dx5 dy5 dx6 hflex1 (12 36)
            36 => self.hflex1()?,
            // dx1 dy1 dx2 dy2 dx3 dy3 dx4 dy4 dx5 dy5 d6 flex1 (12 37)
            37 => self.flex1()?,
            _ => return Err(DecodeError::UnsupportedCharstringOperator { operator }),
        }

        Ok(())
    }

    fn push(&mut self, n: f32) -> DecodeResult<()> {
        if self.operand_stack.len() >= MAX_STACK_DEPTH {
            return Err(DecodeError::StackOverflow);
        }

        self.operand_stack.push_back(n);

        Ok(())
    }

    fn push_bool(&mut self, b: bool) -> DecodeResult<()> {
        self.push(if b { 1.0 } else { 0.0 })
    }

    fn pop(&mut self) -> DecodeResult<f32> {
        self.operand_stack
            .pop_back()
            .ok_or(DecodeError::StackUnderflow)
    }

    /// Pop `num1 num2`, where `num2` is on top
    fn pop_pair(&mut self) -> DecodeResult<(f32, f32)> {
        let b = self.pop()?;
        let a = self.pop()?;
        Ok((a, b))
    }

    fn pop_front(&mut self) -> DecodeResult<f32> {
        self.operand_stack
            .pop_front()
            .ok_or(DecodeError::StackUnderflow)
    }

    fn require(&self, n: usize) -> DecodeResult<()> {
        if self.operand_stack.len() < n {
            return Err(DecodeError::StackUnderflow);
        }

        Ok(())
    }

    /// The first stack-clearing operator may carry the advance width as an
    /// extra leading argument. On any later operator the extra argument is
    /// dropped
    fn maybe_take_width(&mut self, has_width: bool) -> DecodeResult<()> {
        let first = std::mem::replace(&mut self.first_stack_clearing_op, false);

        if has_width {
            let w = self.pop_front()?;

            if first {
                self.width = Some(self.context.nominal_width_x + w);
            }
        }

        Ok(())
    }

    fn transient_index(&self, i: f32) -> DecodeResult<usize> {
        let index = i as i32;

        if !(0..TRANSIENT_ARRAY_LEN as i32).contains(&index) {
            return Err(DecodeError::TransientArrayIndexOutOfRange { index });
        }

        Ok(index as usize)
    }

    /// A pseudo-random number in `(0, 1]`, reproducible per glyph
    fn random(&mut self) -> f32 {
        let mut x = self.random_state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.random_state = x;

        (x as f64 / u32::MAX as f64) as f32
    }

    /// replaces `i` with a copy of the element `i` places below it. A negative
    /// `i` copies the top element
    fn index(&mut self) -> DecodeResult<()> {
        let i = self.pop()? as i32;
        let len = self.operand_stack.len();

        let value = if i < 0 {
            self.operand_stack.back().copied()
        } else {
            (i as usize)
                .checked_add(1)
                .and_then(|depth| len.checked_sub(depth))
                .and_then(|idx| self.operand_stack.get(idx).copied())
        };

        self.push(value.ok_or(DecodeError::StackUnderflow)?)
    }

    /// performs a circular shift of the top `N` elements by `J` positions.
    /// Positive `J` moves elements towards the top of the stack
    fn roll(&mut self) -> DecodeResult<()> {
        let j = self.pop()? as i32;
        let n = self.pop()? as i32;

        if n <= 0 {
            return Err(DecodeError::InvalidOperand);
        }

        let n = n as usize;
        let len = self.operand_stack.len();
        if n > len {
            return Err(DecodeError::StackUnderflow);
        }

        let shift = j.rem_euclid(n as i32) as usize;
        self.operand_stack.make_contiguous()[len - n..].rotate_right(shift);

        Ok(())
    }

    fn call_subroutine(&mut self, global: bool) -> DecodeResult<Flow> {
        let index = self.pop()? as i32;

        let subrs = if global {
            self.context.global_subrs
        } else {
            self.context.local_subrs
        };

        let subr = index
            .checked_add(subroutine_bias(subrs.len()))
            .and_then(|biased| usize::try_from(biased).ok())
            .and_then(|biased| subrs.get(biased))
            .ok_or(DecodeError::InvalidSubroutineIndex { index })?;

        if self.call_depth >= self.context.limits.max_call_depth {
            return Err(DecodeError::RecursionLimitExceeded {
                depth: self.call_depth + 1,
            });
        }

        log::trace!(
            "calling {} subroutine {} ({} bytes)",
            if global { "global" } else { "local" },
            index,
            subr.len()
        );

        let buffer = std::mem::replace(&mut self.buffer, subr);
        let cursor = std::mem::replace(&mut self.cursor, 0);
        self.call_depth += 1;

        let flow = self.execute();

        self.call_depth -= 1;
        self.buffer = buffer;
        self.cursor = cursor;

        flow
    }

    /// declares horizontal or vertical stem hints. The stems themselves are
    /// not applied; only their count is tracked, since it determines the
    /// length of hintmask and cntrmask data
    fn stem(&mut self) -> DecodeResult<()> {
        self.maybe_take_width(self.operand_stack.len() % 2 == 1)?;

        self.stem_count += self.operand_stack.len() / 2;
        self.operand_stack.clear();

        Ok(())
    }

    /// hintmask and cntrmask are followed by one bit per declared stem,
    /// rounded up to whole bytes. Operands still on the stack are an implicit
    /// vstem
    fn mask(&mut self) -> DecodeResult<()> {
        self.stem()?;

        let num_bytes = (self.stem_count + 7) / 8;
        self.skip(num_bytes)?;

        Ok(())
    }

    /// moves the current point to a position at the relative coordinates (dx1, dy1)
    fn rmoveto(&mut self) -> DecodeResult<()> {
        self.maybe_take_width(self.operand_stack.len() > 2)?;

        let dx = self.pop_front()?;
        let dy = self.pop_front()?;

        self.path_builder.relative_move_to(dx, dy);

        self.operand_stack.clear();
        Ok(())
    }

    /// moves the current point dx1 units in the horizontal direction
    fn hmoveto(&mut self) -> DecodeResult<()> {
        self.maybe_take_width(self.operand_stack.len() > 1)?;

        let dx1 = self.pop_front()?;
        self.path_builder.relative_move_to(dx1, 0.0);

        self.operand_stack.clear();
        Ok(())
    }

    /// moves the current point dy1 units in the vertical direction
    fn vmoveto(&mut self) -> DecodeResult<()> {
        self.maybe_take_width(self.operand_stack.len() > 1)?;

        let dy1 = self.pop_front()?;
        self.path_builder.relative_move_to(0.0, dy1);

        self.operand_stack.clear();
        Ok(())
    }

    /// appends a line from the current point to the relative coordinates
    /// dxa, dya, and one more line for every following pair
    fn rlineto(&mut self) -> DecodeResult<()> {
        self.require(2)?;

        while self.operand_stack.len() >= 2 {
            let dx = self.pop_front()?;
            let dy = self.pop_front()?;

            self.path_builder.relative_line_to(dx, dy);
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// hlineto and vlineto: each argument is one line, alternating between
    /// horizontal and vertical, starting with the axis the operator names
    fn alternating_lines(&mut self, mut horizontal: bool) -> DecodeResult<()> {
        self.require(1)?;

        while let Some(d) = self.operand_stack.pop_front() {
            if horizontal {
                self.path_builder.horizontal_line_to(d);
            } else {
                self.path_builder.vertical_line_to(d);
            }

            horizontal = !horizontal;
        }

        Ok(())
    }

    fn curve_from_front(&mut self) -> DecodeResult<()> {
        let dx1 = self.pop_front()?;
        let dy1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dy3 = self.pop_front()?;

        self.path_builder
            .relative_relative_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);

        Ok(())
    }

    /// appends a Bézier curve for each set of six arguments. Control points
    /// are relative to the previous point of the curve
    fn rrcurveto(&mut self) -> DecodeResult<()> {
        self.require(6)?;

        while self.operand_stack.len() >= 6 {
            self.curve_from_front()?;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// is equivalent to one rrcurveto for each set of six arguments dxa...dyc,
    /// followed by exactly one rlineto using the dxd, dyd arguments
    fn rcurveline(&mut self) -> DecodeResult<()> {
        self.require(2)?;

        let curves = (self.operand_stack.len() - 2) / 6;
        for _ in 0..curves {
            self.curve_from_front()?;
        }

        let dx = self.pop_front()?;
        let dy = self.pop_front()?;
        self.path_builder.relative_line_to(dx, dy);

        self.operand_stack.clear();
        Ok(())
    }

    /// is equivalent to one rlineto for each pair of arguments beyond the six
    /// arguments dxb...dyd needed for the one rrcurveto command
    fn rlinecurve(&mut self) -> DecodeResult<()> {
        self.require(6)?;

        let lines = (self.operand_stack.len() - 6) / 2;
        for _ in 0..lines {
            let dx = self.pop_front()?;
            let dy = self.pop_front()?;
            self.path_builder.relative_line_to(dx, dy);
        }

        self.curve_from_front()?;

        self.operand_stack.clear();
        Ok(())
    }

    /// appends curves that start and end horizontal. With an odd argument
    /// count the first value is the dy of the first control point
    fn hhcurveto(&mut self) -> DecodeResult<()> {
        let mut dy1 = if self.operand_stack.len() % 2 == 1 {
            self.pop_front()?
        } else {
            0.0
        };

        self.require(4)?;

        while self.operand_stack.len() >= 4 {
            let dxa = self.pop_front()?;
            let dxb = self.pop_front()?;
            let dyb = self.pop_front()?;
            let dxc = self.pop_front()?;

            self.path_builder
                .relative_relative_curve_to(dxa, dy1, dxb, dyb, dxc, 0.0);

            dy1 = 0.0;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// appends curves that start and end vertical. With an odd argument count
    /// the first value is the dx of the first control point
    fn vvcurveto(&mut self) -> DecodeResult<()> {
        let mut dx1 = if self.operand_stack.len() % 2 == 1 {
            self.pop_front()?
        } else {
            0.0
        };

        self.require(4)?;

        while self.operand_stack.len() >= 4 {
            let dya = self.pop_front()?;
            let dxb = self.pop_front()?;
            let dyb = self.pop_front()?;
            let dyc = self.pop_front()?;

            self.path_builder
                .relative_relative_curve_to(dx1, dya, dxb, dyb, 0.0, dyc);

            dx1 = 0.0;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// hvcurveto and vhcurveto: curves alternate between starting horizontal
    /// and ending vertical, and starting vertical and ending horizontal. A
    /// single argument left over after the last group of four supplies the
    /// final coordinate of the last curve, which then need not end
    /// horizontal or vertical
    fn alternating_curves(&mut self, mut horizontal_start: bool) -> DecodeResult<()> {
        self.require(4)?;

        while self.operand_stack.len() >= 4 {
            let d1 = self.pop_front()?;
            let d2 = self.pop_front()?;
            let d3 = self.pop_front()?;
            let d4 = self.pop_front()?;

            let last = if self.operand_stack.len() == 1 {
                self.pop_front()?
            } else {
                0.0
            };

            if horizontal_start {
                self.path_builder
                    .relative_relative_curve_to(d1, 0.0, d2, d3, last, d4);
            } else {
                self.path_builder
                    .relative_relative_curve_to(0.0, d1, d2, d3, d4, last);
            }

            horizontal_start = !horizontal_start;
        }

        self.operand_stack.clear();
        Ok(())
    }

    /// two Bézier curves which a renderer may draw as a straight line when the
    /// flex depth `fd / 100` is under a device pixel. The curves are always
    /// emitted here
    fn flex(&mut self) -> DecodeResult<()> {
        self.require(13)?;

        self.curve_from_front()?;
        self.curve_from_front()?;

        let _fd = self.pop_front()?;

        self.operand_stack.clear();
        Ok(())
    }

    /// a flex whose start, end, first and last control points share a y
    /// value. The join point is raised by dy2 and the second curve comes back
    /// down by the same amount
    fn hflex(&mut self) -> DecodeResult<()> {
        self.require(7)?;

        let dx1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dx4 = self.pop_front()?;
        let dx5 = self.pop_front()?;
        let dx6 = self.pop_front()?;

        self.path_builder
            .relative_relative_curve_to(dx1, 0.0, dx2, dy2, dx3, 0.0);
        self.path_builder
            .relative_relative_curve_to(dx4, 0.0, dx5, -dy2, dx6, 0.0);

        self.operand_stack.clear();
        Ok(())
    }

    /// a flex whose start and end points share a y value, as do the join
    /// point and its neighbouring control points
    fn hflex1(&mut self) -> DecodeResult<()> {
        self.require(9)?;

        let dx1 = self.pop_front()?;
        let dy1 = self.pop_front()?;
        let dx2 = self.pop_front()?;
        let dy2 = self.pop_front()?;
        let dx3 = self.pop_front()?;
        let dx4 = self.pop_front()?;
        let dx5 = self.pop_front()?;
        let dy5 = self.pop_front()?;
        let dx6 = self.pop_front()?;

        let dy6 = -(dy1 + dy2 + dy5);

        self.path_builder
            .relative_relative_curve_to(dx1, dy1, dx2, dy2, dx3, 0.0);
        self.path_builder
            .relative_relative_curve_to(dx4, 0.0, dx5, dy5, dx6, dy6);

        self.operand_stack.clear();
        Ok(())
    }

    /// a flex whose start and end points share an x or a y value
    ///
    /// d6 is either dx6 or dy6. Summing all other deltas gives (dx, dy) from
    /// the start point to the last control point. If abs(dx) > abs(dy), d6 is
    /// the x delta and the end point returns to the starting y. Otherwise d6
    /// is the y delta and the end point returns to the starting x
    fn flex1(&mut self) -> DecodeResult<()> {
        self.require(11)?;

        let mut deltas = [0.0f32; 10];
        for d in deltas.iter_mut() {
            *d = self.pop_front()?;
        }
        let d6 = self.pop_front()?;

        let dx: f32 = deltas.iter().step_by(2).sum();
        let dy: f32 = deltas.iter().skip(1).step_by(2).sum();

        let (dx6, dy6) = if dx.abs() > dy.abs() {
            (d6, -dy)
        } else {
            (-dx, d6)
        };

        let [dx1, dy1, dx2, dy2, dx3, dy3, dx4, dy4, dx5, dy5] = deltas;

        self.path_builder
            .relative_relative_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);
        self.path_builder
            .relative_relative_curve_to(dx4, dy4, dx5, dy5, dx6, dy6);

        self.operand_stack.clear();
        Ok(())
    }

    /// finishes a charstring outline definition. With four remaining
    /// arguments (`adx ady bchar achar`), the glyph is an accented character
    /// composed from two other glyphs
    fn end_char(&mut self) -> DecodeResult<()> {
        let len = self.operand_stack.len();
        self.maybe_take_width(len == 1 || len == 5)?;

        if self.operand_stack.len() == 4 {
            let adx = self.pop_front()?;
            let ady = self.pop_front()?;
            let base = standard_code(self.pop_front()?)?;
            let accent = standard_code(self.pop_front()?)?;

            self.seac = Some(Seac {
                adx,
                ady,
                base,
                accent,
            });
        }

        self.operand_stack.clear();
        self.path_builder.close_path();

        Ok(())
    }
}

fn standard_code(n: f32) -> DecodeResult<u8> {
    if n.fract() != 0.0 || !(0.0..=255.0).contains(&n) {
        return Err(DecodeError::InvalidOperand);
    }

    Ok(n as u8)
}

impl<'a> BinaryParser for CffCharStringInterpreter<'a> {
    fn buffer(&self) -> &[u8] {
        self.buffer
    }
    fn cursor(&self) -> usize {
        self.cursor
    }
    fn cursor_mut(&mut self) -> &mut usize {
        &mut self.cursor
    }
}
