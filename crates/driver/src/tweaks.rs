//! Interactive tweak controls and the per-session values they mutate.
//!
//! Every session owns one [`TweakValues`] record seeded from the selected
//! example's [`TweakSpec`]s. Control callbacks receive that record
//! explicitly; no state outlives the session it belongs to.

/// Kind of control rendered for a tweak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// Bounded slider with a live value readout.
    Range,
    /// Free numeric entry.
    Number,
}

/// Callback invoked with the committed raw input value and the session's
/// tweak record. Callbacks must not fail; they only write values.
pub type TweakCallback = fn(f64, &mut TweakValues);

/// Static description of one tweakable parameter of an example.
#[derive(Debug, Clone, Copy)]
pub struct TweakSpec {
    pub name: &'static str,
    pub kind: ControlKind,
    pub min: f64,
    pub max: f64,
    pub step: f64,
    pub initial: f64,
    pub on_input: TweakCallback,
}

impl TweakSpec {
    /// A range control with a step of 1.
    pub fn range(
        name: &'static str,
        min: f64,
        max: f64,
        initial: f64,
        on_input: TweakCallback,
    ) -> Self {
        Self {
            name,
            kind: ControlKind::Range,
            min,
            max,
            step: 1.0,
            initial,
            on_input,
        }
    }

    pub fn with_step(mut self, step: f64) -> Self {
        self.step = step;
        self
    }
}

/// Ordered, session-owned record of tweakable values.
///
/// Seeded from the specs' initial values on selection; read by the
/// example's loop each frame; written by control callbacks. The shell's
/// cooperative scheduling guarantees a callback completes before the next
/// frame runs, so the next frame always sees the latest committed value.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct TweakValues {
    entries: Vec<(&'static str, f64)>,
}

impl TweakValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the record with each spec's stated initial value.
    pub fn seeded(specs: &[TweakSpec]) -> Self {
        let mut values = Self::new();
        for spec in specs {
            values.set(spec.name, spec.initial);
        }
        values
    }

    pub fn set(&mut self, name: &'static str, value: f64) {
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }
}

/// One rendered control: its spec, the last committed raw value, and the
/// visible readout (range controls only).
#[derive(Debug, Clone)]
pub struct TweakControl {
    spec: TweakSpec,
    value: f64,
    readout: Option<String>,
}

impl TweakControl {
    fn new(spec: TweakSpec) -> Self {
        let readout = match spec.kind {
            ControlKind::Range => Some(stringify(spec.initial)),
            ControlKind::Number => None,
        };
        Self {
            spec,
            value: spec.initial,
            readout,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn kind(&self) -> ControlKind {
        self.spec.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Visible readout text; `None` for controls without one.
    pub fn readout(&self) -> Option<&str> {
        self.readout.as_deref()
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.spec.min, self.spec.max)
    }

    pub fn step(&self) -> f64 {
        self.spec.step
    }
}

/// The set of controls for the currently selected example, in the
/// descriptor's insertion order. Empty (and hidden) for examples without
/// tweaks.
#[derive(Debug, Default)]
pub struct TweakPanel {
    controls: Vec<TweakControl>,
}

impl TweakPanel {
    pub fn new(specs: &[TweakSpec]) -> Self {
        Self {
            controls: specs.iter().copied().map(TweakControl::new).collect(),
        }
    }

    /// A panel with no controls is not shown at all.
    pub fn hidden(&self) -> bool {
        self.controls.is_empty()
    }

    pub fn controls(&self) -> &[TweakControl] {
        &self.controls
    }

    pub fn control_index(&self, name: &str) -> Option<usize> {
        self.controls.iter().position(|c| c.name() == name)
    }

    /// Commits an input value to the control at `index`.
    ///
    /// The raw value is clamped to the control's bounds, the readout is
    /// updated to the committed value's text, and only then is the
    /// control's callback invoked, exactly once, with the committed value
    /// and the session record. Returns the committed value.
    pub fn input(&mut self, index: usize, raw: f64, values: &mut TweakValues) -> Option<f64> {
        let control = self.controls.get_mut(index)?;
        let committed = raw.clamp(control.spec.min, control.spec.max);
        control.value = committed;
        if control.spec.kind == ControlKind::Range {
            control.readout = Some(stringify(committed));
        }
        (control.spec.on_input)(committed, values);
        Some(committed)
    }

    /// Moves the control at `index` by `steps` increments of its step size.
    pub fn nudge(&mut self, index: usize, steps: i32, values: &mut TweakValues) -> Option<f64> {
        let raw = {
            let control = self.controls.get(index)?;
            control.value + f64::from(steps) * control.spec.step
        };
        self.input(index, raw, values)
    }
}

/// Readout formatting: integral values print without a fraction.
fn stringify(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_spec() -> TweakSpec {
        TweakSpec::range("count", 1.0, 100.0, 50.0, |v, t| t.set("count", v))
    }

    #[test]
    fn seeds_initial_values_in_order() {
        let specs = [
            count_spec(),
            TweakSpec::range("interval", 10.0, 1000.0, 400.0, |v, t| t.set("interval", v)),
        ];
        let values = TweakValues::seeded(&specs);
        assert_eq!(values.get("count"), Some(50.0));
        assert_eq!(values.get("interval"), Some(400.0));
    }

    #[test]
    fn empty_panel_is_hidden() {
        let panel = TweakPanel::new(&[]);
        assert!(panel.hidden());
    }

    #[test]
    fn input_updates_readout_and_invokes_callback_once() {
        let mut panel = TweakPanel::new(&[count_spec()]);
        let mut values = TweakValues::seeded(&[count_spec()]);

        let committed = panel.input(0, 72.0, &mut values);
        assert_eq!(committed, Some(72.0));
        assert_eq!(panel.controls()[0].readout(), Some("72"));
        // the callback wrote exactly the committed value
        assert_eq!(values.get("count"), Some(72.0));
    }

    #[test]
    fn input_clamps_to_bounds() {
        let mut panel = TweakPanel::new(&[count_spec()]);
        let mut values = TweakValues::seeded(&[count_spec()]);

        assert_eq!(panel.input(0, 500.0, &mut values), Some(100.0));
        assert_eq!(values.get("count"), Some(100.0));
        assert_eq!(panel.input(0, -3.0, &mut values), Some(1.0));
        assert_eq!(panel.controls()[0].readout(), Some("1"));
    }

    #[test]
    fn nudge_moves_by_step() {
        let spec = TweakSpec::range("scale", -5.0, 5.0, 1.0, |v, t| t.set("scale", v)).with_step(0.1);
        let mut panel = TweakPanel::new(&[spec]);
        let mut values = TweakValues::seeded(&[spec]);

        let committed = panel.nudge(0, -2, &mut values).unwrap();
        assert!((committed - 0.8).abs() < 1e-9);
        assert_eq!(values.get("scale"), Some(committed));
    }

    #[test]
    fn callback_may_transform_before_writing() {
        let spec = TweakSpec::range("angle", 0.0, 360.0, 0.0, |v, t| {
            t.set("angle", (360.0 - v).to_radians())
        });
        let mut panel = TweakPanel::new(&[spec]);
        let mut values = TweakValues::seeded(&[spec]);

        panel.input(0, 90.0, &mut values);
        // readout shows the raw input, the record holds the transform
        assert_eq!(panel.controls()[0].readout(), Some("90"));
        let stored = values.get("angle").unwrap();
        assert!((stored - 270f64.to_radians()).abs() < 1e-9);
    }

    #[test]
    fn stringify_trims_integral_values() {
        assert_eq!(stringify(400.0), "400");
        assert_eq!(stringify(0.5), "0.5");
    }
}
