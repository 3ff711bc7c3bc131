mod basics;
mod how_it_works;

use crate::Section;

pub fn section() -> Section {
    Section::group("Fundamentals", vec![basics::section(), how_it_works::section()])
}
