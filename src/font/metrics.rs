//! Advance widths of the standard PDF fonts.
//!
//! Widths come from the Adobe AFM files, in 1/1000 em, for the printable
//! ASCII range (0x20..=0x7E) in WinAnsiEncoding order. Accented Latin-1
//! letters take the width of their base letter.

use super::StandardFont;

/// Width table for one standard font.
pub struct StandardFontMetrics {
    ascii: &'static [u16; 95],
    bold: bool,
    monospace: bool,
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // p..~
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

const COURIER: [u16; 95] = [600; 95];

impl StandardFont {
    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaOblique => StandardFontMetrics {
                ascii: &HELVETICA,
                bold: false,
                monospace: false,
            },
            StandardFont::HelveticaBold | StandardFont::HelveticaBoldOblique => {
                StandardFontMetrics {
                    ascii: &HELVETICA_BOLD,
                    bold: true,
                    monospace: false,
                }
            }
            StandardFont::Courier => StandardFontMetrics {
                ascii: &COURIER,
                bold: false,
                monospace: true,
            },
        }
    }
}

impl StandardFontMetrics {
    /// Advance width in 1/1000 em.
    pub fn advance(&self, ch: char) -> u16 {
        if self.monospace {
            return 600;
        }
        if let Some(i) = ascii_index(ch) {
            return self.ascii[i];
        }
        if let Some(w) = self.punctuation(ch) {
            return w;
        }
        match latin1_base(ch).and_then(ascii_index) {
            Some(i) => self.ascii[i],
            None => 556,
        }
    }

    /// Width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.advance(ch) as f64 / 1000.0 * font_size
    }

    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }

    fn punctuation(&self, ch: char) -> Option<u16> {
        let (regular, bold) = match ch {
            '\u{2022}' => (350, 350),   // bullet
            '\u{2013}' => (556, 556),   // en dash
            '\u{2014}' => (1000, 1000), // em dash
            '\u{2018}' | '\u{2019}' => (222, 278),
            '\u{201C}' | '\u{201D}' => (333, 500),
            '\u{2026}' => (1000, 1000),
            '\u{20AC}' => (556, 556),
            '\u{00A0}' => (278, 278),
            '\u{00B0}' => (400, 400),
            '\u{00A9}' | '\u{00AE}' => (737, 737),
            '\u{00D7}' => (584, 584),
            _ => return None,
        };
        Some(if self.bold { bold } else { regular })
    }
}

fn ascii_index(ch: char) -> Option<usize> {
    let cp = ch as u32;
    (0x20..=0x7E).contains(&cp).then(|| (cp - 0x20) as usize)
}

/// Base letter of an accented Latin-1 letter.
fn latin1_base(ch: char) -> Option<char> {
    let base = match ch {
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' | 'Ø' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' | 'ø' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helvetica_space_and_letters() {
        let m = StandardFont::Helvetica.metrics();
        assert_eq!(m.advance(' '), 278);
        assert_eq!(m.advance('A'), 667);
        assert_eq!(m.advance('i'), 222);
        assert_eq!(m.advance('~'), 584);
    }

    #[test]
    fn bold_is_wider_where_it_should_be() {
        let regular = StandardFont::Helvetica.metrics();
        let bold = StandardFont::HelveticaBold.metrics();
        assert!(bold.advance('A') > regular.advance('A'));
        assert_eq!(bold.advance('0'), regular.advance('0'));
    }

    #[test]
    fn courier_is_monospaced() {
        let m = StandardFont::Courier.metrics();
        assert_eq!(m.advance('i'), m.advance('W'));
        assert_eq!(m.advance('北'), 600);
    }

    #[test]
    fn accented_letters_use_base_width() {
        let m = StandardFont::Helvetica.metrics();
        assert_eq!(m.advance('é'), m.advance('e'));
        assert_eq!(m.advance('Ö'), m.advance('O'));
        assert_eq!(m.advance('\u{2022}'), 350);
    }

    #[test]
    fn measure_string_sums_widths() {
        let m = StandardFont::Helvetica.metrics();
        let w = m.measure_string("AA", 10.0, 1.0);
        assert!((w - (6.67 * 2.0 + 2.0)).abs() < 1e-9);
    }
}
