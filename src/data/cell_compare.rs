use crate::data::result_set::CellValue;
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// How a column's cells are ordered.
///
/// A column is numeric while every cell is a number or blank (null or the
/// empty string). A single non-empty string switches the whole column to
/// text, so numbers and strings never meet under two different rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareMode {
    Numeric,
    Text,
}

impl CompareMode {
    pub fn for_cells<'a>(cells: impl IntoIterator<Item = &'a CellValue>) -> Self {
        let has_text = cells
            .into_iter()
            .any(|cell| matches!(cell, CellValue::String(s) if !s.is_empty()));
        if has_text {
            CompareMode::Text
        } else {
            CompareMode::Numeric
        }
    }
}

/// Precomputed ordering key for one cell. Keys built with the same
/// [`CompareMode`] form a total order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SortKey {
    Numeric(NumericKey),
    Text(CollationKey),
}

impl SortKey {
    pub fn new(cell: &CellValue, mode: CompareMode) -> Self {
        match mode {
            CompareMode::Numeric => SortKey::Numeric(NumericKey::new(cell)),
            CompareMode::Text => SortKey::Text(CollationKey::new(&cell.as_text())),
        }
    }
}

/// Blanks first, then numbers by exact value, then NaN.
#[derive(Debug, Clone, Copy)]
pub enum NumericKey {
    Blank,
    Integer(i64),
    Float(f64),
    NaN,
}

impl NumericKey {
    fn new(cell: &CellValue) -> Self {
        match cell {
            CellValue::Integer(i) => NumericKey::Integer(*i),
            CellValue::Float(f) if f.is_nan() => NumericKey::NaN,
            CellValue::Float(f) => NumericKey::Float(*f),
            CellValue::String(_) | CellValue::Null => NumericKey::Blank,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            NumericKey::Blank => 0,
            NumericKey::Integer(_) | NumericKey::Float(_) => 1,
            NumericKey::NaN => 2,
        }
    }
}

impl Ord for NumericKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NumericKey::Integer(a), NumericKey::Integer(b)) => a.cmp(b),
            // Neither side is NaN here
            (NumericKey::Float(a), NumericKey::Float(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (NumericKey::Integer(i), NumericKey::Float(f)) => compare_int_float(*i, *f),
            (NumericKey::Float(f), NumericKey::Integer(i)) => compare_int_float(*i, *f).reverse(),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for NumericKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for NumericKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NumericKey {}

/// Exact comparison of an integer with a non-NaN float, without rounding
/// the integer through `f64`.
fn compare_int_float(i: i64, f: f64) -> Ordering {
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    match i.cmp(&(whole as i64)) {
        Ordering::Equal if f > whole => Ordering::Less,
        Ordering::Equal if f < whole => Ordering::Greater,
        ordering => ordering,
    }
}

/// Collation key for [`locale_compare`].
///
/// Fields compare in order: base letters with accents and case removed,
/// then accents, then case (lowercase first), then raw code points.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CollationKey {
    base: String,
    accents: String,
    uppercase: Vec<bool>,
    raw: String,
}

impl CollationKey {
    pub fn new(text: &str) -> Self {
        let decomposed: String = text.nfd().flat_map(char::to_lowercase).collect();
        let base = decomposed
            .chars()
            .filter(|c| !is_combining_mark(*c))
            .collect();
        Self {
            base,
            accents: decomposed,
            uppercase: text.nfd().map(char::is_uppercase).collect(),
            raw: text.to_string(),
        }
    }
}

/// Compare two cells for sorting.
///
/// Two numeric cells compare numerically (integers and floats mix freely).
/// Anything else, including a number against a non-empty string, is compared
/// by its text form with [`locale_compare`]. Null reads as the empty string.
/// Sorting a column goes through [`SortKey`] instead, which applies one mode
/// to the whole column.
pub fn compare_cells(a: &CellValue, b: &CellValue) -> Ordering {
    let mode = CompareMode::for_cells([a, b]);
    SortKey::new(a, mode).cmp(&SortKey::new(b, mode))
}

/// Locale-aware string ordering without a collation table.
///
/// Accented letters sort with their base letter ("Émile" between "Elena"
/// and "Fred") and case is ignored at first, so "apple" sorts next to
/// "Apple" rather than after every uppercase word.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    CollationKey::new(a).cmp(&CollationKey::new(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_comparison() {
        assert_eq!(
            compare_cells(&CellValue::Integer(1), &CellValue::Integer(2)),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(&CellValue::Integer(2), &CellValue::Integer(2)),
            Ordering::Equal
        );
        assert_eq!(
            compare_cells(&CellValue::Integer(10), &CellValue::Integer(9)),
            Ordering::Greater
        );
    }

    #[test]
    fn test_mixed_numeric_comparison() {
        assert_eq!(
            compare_cells(&CellValue::Integer(2), &CellValue::Float(2.5)),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(&CellValue::Float(3.0), &CellValue::Integer(3)),
            Ordering::Equal
        );
        assert_eq!(
            compare_cells(&CellValue::Integer(-3), &CellValue::Float(-2.5)),
            Ordering::Less
        );
    }

    #[test]
    fn test_integer_against_float_is_exact() {
        // 2^53 + 1 rounds to 2^53 as f64
        let big = (1_i64 << 53) + 1;
        assert_eq!(compare_int_float(big, (1_i64 << 53) as f64), Ordering::Greater);
        assert_eq!(compare_int_float(i64::MAX, f64::INFINITY), Ordering::Less);
        assert_eq!(compare_int_float(i64::MIN, f64::NEG_INFINITY), Ordering::Greater);
        assert_eq!(compare_int_float(i64::MIN, -9_223_372_036_854_775_808.0), Ordering::Equal);
        assert_eq!(compare_int_float(0, -0.0), Ordering::Equal);
    }

    #[test]
    fn test_nan_sorts_after_numbers() {
        let nan = CellValue::Float(f64::NAN);
        assert_eq!(compare_cells(&nan, &CellValue::Float(f64::INFINITY)), Ordering::Greater);
        assert_eq!(compare_cells(&CellValue::Integer(i64::MAX), &nan), Ordering::Less);
        assert_eq!(compare_cells(&nan, &CellValue::Float(f64::NAN)), Ordering::Equal);
        assert_eq!(compare_cells(&CellValue::Null, &nan), Ordering::Less);
    }

    #[test]
    fn test_number_against_string_uses_text() {
        // "10" < "9" as text, which is what a mixed column sorts by
        assert_eq!(
            compare_cells(&CellValue::Integer(10), &CellValue::String("9".into())),
            Ordering::Less
        );
    }

    #[test]
    fn test_mode_is_text_once_any_string_appears() {
        let cells = [CellValue::Integer(2), CellValue::Null, CellValue::String("".into())];
        assert_eq!(CompareMode::for_cells(&cells), CompareMode::Numeric);

        let cells = [CellValue::Integer(2), CellValue::String("1a".into())];
        assert_eq!(CompareMode::for_cells(&cells), CompareMode::Text);

        // Under one mode the 2 / 10 / "1a" cycle cannot happen
        let mode = CompareMode::Text;
        let two = SortKey::new(&CellValue::Integer(2), mode);
        let ten = SortKey::new(&CellValue::Integer(10), mode);
        let text = SortKey::new(&CellValue::String("1a".into()), mode);
        assert!(ten < text && text < two && ten < two);
    }

    #[test]
    fn test_null_sorts_as_empty_string() {
        assert_eq!(
            compare_cells(&CellValue::Null, &CellValue::String("a".into())),
            Ordering::Less
        );
        assert_eq!(
            compare_cells(&CellValue::Null, &CellValue::String(String::new())),
            Ordering::Equal
        );
        assert_eq!(
            compare_cells(&CellValue::Integer(0), &CellValue::Null),
            Ordering::Greater
        );
    }

    #[test]
    fn test_locale_compare_ignores_case_first() {
        assert_eq!(locale_compare("apple", "Banana"), Ordering::Less);
        assert_eq!(locale_compare("Zebra", "apple"), Ordering::Greater);
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("A", "a"), Ordering::Greater);
        assert_eq!(locale_compare("same", "same"), Ordering::Equal);
    }

    #[test]
    fn test_accents_sort_with_base_letter() {
        assert_eq!(locale_compare("Émile", "Fred"), Ordering::Less);
        assert_eq!(locale_compare("Elena", "Émile"), Ordering::Less);
        assert_eq!(locale_compare("zoë", "Zof"), Ordering::Less);
        assert_eq!(locale_compare("Zoe", "zoë"), Ordering::Less);
        // Precomposed and decomposed forms differ only in the last tie-break
        assert_eq!(
            locale_compare("\u{e9}", "e\u{301}"),
            "\u{e9}".cmp("e\u{301}")
        );

        let mut names = vec!["Zoe", "Émile", "Elena", "Fred", "zoë", "Zof"];
        names.sort_by(|a, b| locale_compare(a, b));
        assert_eq!(names, vec!["Elena", "Émile", "Fred", "Zoe", "zoë", "Zof"]);
    }

    #[test]
    fn test_prefix_sorts_first() {
        assert_eq!(locale_compare("User 1", "User 10"), Ordering::Less);
        assert_eq!(locale_compare("", "x"), Ordering::Less);
    }
}
