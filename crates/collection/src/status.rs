use std::fmt;

/// One-line summary of the collection and the visible page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusLine {
    pub total: usize,
    pub filtered: usize,
    pub page: usize,
    pub page_count: usize,
    pub order: String,
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.filtered == self.total {
            write!(f, "{} tracks; ", with_commas(self.total))?;
        } else {
            write!(
                f,
                "Filtered {} of {} tracks; ",
                with_commas(self.filtered),
                with_commas(self.total)
            )?;
        }
        write!(
            f,
            "Page {} of {}",
            with_commas(self.page + 1),
            with_commas(self.page_count)
        )
    }
}

pub fn with_commas(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
