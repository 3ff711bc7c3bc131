use driver::ExampleDescriptor;

use crate::Section;

/// Path to one example inside the section forest.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExamplePath {
    sections: Vec<usize>,
    example: usize,
}

/// One selectable entry: a breadcrumb label and where to find the example.
#[derive(Debug, Clone)]
pub struct NavigationEntry {
    pub label: String,
    path: ExamplePath,
}

/// Depth-first flattening of the catalog into an ordered, selectable list.
///
/// Within each section, examples come before child sections, matching the
/// reading order of the rendered table of contents. The index owns no
/// references into the forest; entries are resolved against it on demand.
#[derive(Debug, Default)]
pub struct NavigationIndex {
    entries: Vec<NavigationEntry>,
}

impl NavigationIndex {
    pub fn new(sections: &[Section]) -> Self {
        let mut index = Self::default();
        let mut crumbs = Vec::new();
        let mut path = Vec::new();
        index.visit(sections, &mut crumbs, &mut path);
        index
    }

    fn visit(
        &mut self,
        sections: &[Section],
        crumbs: &mut Vec<&'static str>,
        path: &mut Vec<usize>,
    ) {
        for (section_idx, section) in sections.iter().enumerate() {
            crumbs.push(section.title);
            path.push(section_idx);
            for (example_idx, example) in section.examples.iter().enumerate() {
                let mut label = crumbs.join(" / ");
                label.push_str(" / ");
                label.push_str(example.title);
                self.entries.push(NavigationEntry {
                    label,
                    path: ExamplePath {
                        sections: path.clone(),
                        example: example_idx,
                    },
                });
            }
            self.visit(&section.sections, crumbs, path);
            path.pop();
            crumbs.pop();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[NavigationEntry] {
        &self.entries
    }

    pub fn label(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(|entry| entry.label.as_str())
    }

    /// Looks the entry up in the forest the index was built from.
    pub fn resolve<'a>(
        &self,
        sections: &'a [Section],
        index: usize,
    ) -> Option<&'a ExampleDescriptor> {
        let entry = self.entries.get(index)?;
        let mut level = sections;
        let mut current: Option<&Section> = None;
        for &section_idx in &entry.path.sections {
            let section = level.get(section_idx)?;
            level = &section.sections;
            current = Some(section);
        }
        current?.examples.get(entry.path.example)
    }

    /// Finds the first entry whose label contains `query`
    /// (case-insensitive).
    pub fn find(&self, query: &str) -> Option<usize> {
        let needle = query.to_lowercase();
        self.entries
            .iter()
            .position(|entry| entry.label.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use driver::{ExampleDescriptor, FramePacing, GlFacade, ProgramId, TweakValues};

    fn noop_setup(_gl: &mut dyn GlFacade, _program: ProgramId, _t: &TweakValues) -> Result<()> {
        Ok(())
    }

    fn noop_frame(
        _gl: &mut dyn GlFacade,
        _program: ProgramId,
        _state: &mut (),
        _t: &TweakValues,
    ) -> Result<FramePacing> {
        Ok(FramePacing::OnRefresh)
    }

    fn example(title: &'static str) -> ExampleDescriptor {
        ExampleDescriptor::animated(title, "ref", "v", "f", Vec::new(), noop_setup, noop_frame)
    }

    fn forest() -> Vec<Section> {
        vec![
            Section::leaf("A", vec![example("x"), example("y")]),
            Section::group("B", vec![Section::leaf("C", vec![example("z")])]),
        ]
    }

    #[test]
    fn depth_first_traversal_visits_each_example_once_in_order() {
        let sections = forest();
        let index = NavigationIndex::new(&sections);

        let titles: Vec<&str> = (0..index.len())
            .map(|i| index.resolve(&sections, i).unwrap().title)
            .collect();
        assert_eq!(titles, vec!["x", "y", "z"]);
    }

    #[test]
    fn labels_carry_breadcrumbs() {
        let sections = forest();
        let index = NavigationIndex::new(&sections);

        assert_eq!(index.label(0), Some("A / x"));
        assert_eq!(index.label(2), Some("B / C / z"));
    }

    #[test]
    fn find_matches_case_insensitively() {
        let sections = forest();
        let index = NavigationIndex::new(&sections);

        assert_eq!(index.find("c / Z"), Some(2));
        assert_eq!(index.find("missing"), None);
    }
}
