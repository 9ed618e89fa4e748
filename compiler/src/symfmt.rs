// symfmt.rs — Symbol-file model and text writer
//
// A Matrix is the flat, generator-facing picture of a CAN network: value
// tables and frames with fully annotated signals. `dump` renders the
// PCAN-style symbol text. Everything is written in insertion order with
// fixed option order on each line, so one Matrix renders to exactly one
// byte sequence.

use std::fmt::Write as _;

use rust_decimal::Decimal;

#[derive(Debug, Clone, Default)]
pub struct Matrix {
    pub title: Option<String>,
    pub enums: Vec<ValueTable>,
    pub frames: Vec<Frame>,
}

/// Named value table emitted into the {ENUMS} section.
#[derive(Debug, Clone)]
pub struct ValueTable {
    pub name: String,
    pub entries: Vec<(i64, String)>,
}

/// One [FrameName] section. A multiplexed message renders as one section
/// per multiplexer value, all sharing the frame name, each carrying its
/// own `mux` line and signal set.
#[derive(Debug, Clone)]
pub struct Frame {
    pub name: String,
    pub id: u32,
    pub extended: bool,
    pub dlc: u8,
    pub receivable: bool,
    pub sendable: bool,
    pub cycle_time: Option<u32>,
    pub comment: Option<String>,
    pub mux: Option<Mux>,
    pub signals: Vec<Sig>,
}

#[derive(Debug, Clone)]
pub struct Mux {
    pub name: String,
    pub start_bit: u16,
    pub bits: u8,
    pub value: u16,
    pub comment: Option<String>,
}

/// One Var line. Annotation fields render only when present; `factor`
/// renders only when it differs from one.
#[derive(Debug, Clone)]
pub struct Sig {
    pub name: String,
    pub signed: bool,
    pub start_bit: u16,
    pub bits: u8,
    pub factor: Decimal,
    pub minimum: Option<Decimal>,
    pub maximum: Option<Decimal>,
    pub default: Option<Decimal>,
    pub units: Option<String>,
    pub enumeration: Option<String>,
    pub hexadecimal: bool,
    pub decimal_places: Option<u32>,
    pub long_name: Option<String>,
    pub comment: Option<String>,
}

impl Sig {
    pub fn new(name: impl Into<String>) -> Self {
        Sig {
            name: name.into(),
            signed: false,
            start_bit: 0,
            bits: 0,
            factor: Decimal::ONE,
            minimum: None,
            maximum: None,
            default: None,
            units: None,
            enumeration: None,
            hexadecimal: false,
            decimal_places: None,
            long_name: None,
            comment: None,
        }
    }
}

fn quote_if_spaced(value: &str) -> String {
    if value.contains(' ') {
        format!("\"{value}\"")
    } else {
        value.to_owned()
    }
}

impl Matrix {
    /// Render the symbol text. Output ends with a newline.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str("FormatVersion=5.0 // Do not edit this line!\n");
        if let Some(title) = &self.title {
            let _ = writeln!(out, "Title=\"{title}\"");
        }

        if !self.enums.is_empty() {
            out.push_str("\n{ENUMS}\n");
            for table in &self.enums {
                let entries: Vec<String> = table
                    .entries
                    .iter()
                    .map(|(value, name)| format!("{value}=\"{name}\""))
                    .collect();
                let _ = writeln!(out, "enum {}({})", table.name, entries.join(", "));
            }
        }

        out.push_str("\n{SENDRECEIVE}\n");
        for frame in &self.frames {
            out.push('\n');
            frame.dump_into(&mut out);
        }
        out
    }
}

impl Frame {
    fn dump_into(&self, out: &mut String) {
        let _ = writeln!(out, "[{}]", self.name);
        let _ = writeln!(out, "ID={:03X}h", self.id);
        if self.extended {
            out.push_str("Type=Extended\n");
        } else {
            out.push_str("Type=Standard\n");
        }
        let _ = writeln!(out, "DLC={}", self.dlc);
        // Both directions are the norm; only deviations are written out.
        if !self.receivable {
            out.push_str("Receivable=False\n");
        }
        if !self.sendable {
            out.push_str("Sendable=False\n");
        }
        if let Some(mux) = &self.mux {
            let _ = write!(
                out,
                "Mux={} {},{} {:X}h",
                quote_if_spaced(&mux.name),
                mux.start_bit,
                mux.bits,
                mux.value
            );
            if let Some(comment) = &mux.comment {
                let _ = write!(out, "\t// {comment}");
            }
            out.push('\n');
        }
        if let Some(cycle_time) = self.cycle_time {
            let _ = writeln!(out, "CycleTime={cycle_time}");
        }
        if let Some(comment) = &self.comment {
            let _ = writeln!(out, "// {comment}");
        }
        for signal in &self.signals {
            signal.dump_into(out);
        }
    }
}

impl Sig {
    fn dump_into(&self, out: &mut String) {
        let _ = write!(
            out,
            "Var={} {} {},{}",
            self.name,
            if self.signed { "signed" } else { "unsigned" },
            self.start_bit,
            self.bits
        );
        if self.hexadecimal {
            out.push_str(" -h");
        }
        if let Some(units) = &self.units {
            let _ = write!(out, " /u:{}", quote_if_spaced(units));
        }
        if self.factor != Decimal::ONE {
            let _ = write!(out, " /f:{}", self.factor);
        }
        if let Some(minimum) = self.minimum {
            let _ = write!(out, " /min:{minimum}");
        }
        if let Some(maximum) = self.maximum {
            let _ = write!(out, " /max:{maximum}");
        }
        if let Some(default) = self.default {
            let _ = write!(out, " /d:{default}");
        }
        if let Some(places) = self.decimal_places {
            let _ = write!(out, " /p:{places}");
        }
        if let Some(enumeration) = &self.enumeration {
            let _ = write!(out, " /e:{enumeration}");
        }
        if let Some(long_name) = &self.long_name {
            let _ = write!(out, " /ln:\"{long_name}\"");
        }
        if let Some(comment) = &self.comment {
            let _ = write!(out, "\t// {comment}");
        }
        out.push('\n');
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
