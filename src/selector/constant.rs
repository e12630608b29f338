use super::ModelSelector;
use crate::model::ModelFitter;

impl<F: ModelFitter> ModelSelector<'_, F> {
    /// The fit at `constant_states`, no scoring.
    pub fn select_constant(&self) -> Option<F::Model> {
        self.base_model(self.config.constant_states)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::SelectorConfig;
    use crate::model::SequenceModel;
    use crate::selector::ModelSelector;
    use crate::test_support::{three_labels, ScriptedFitter};

    #[test]
    fn test_constant_uses_configured_states() {
        let corpora = three_labels();
        let fitter = ScriptedFitter::default();
        for constant_states in [1, 3, 7] {
            let config = SelectorConfig {
                constant_states,
                ..SelectorConfig::default()
            };
            let selector = ModelSelector::new(&fitter, &corpora, "C", &config).unwrap();
            assert_eq!(selector.select_constant().unwrap().n_states(), constant_states);
        }
        // One fit per call, nothing else tried.
        assert_eq!(fitter.recorded().len(), 3);
    }

    #[test]
    fn test_constant_absent_when_fit_fails() {
        let corpora = three_labels();
        let fitter = ScriptedFitter::failing([3]);
        let config = SelectorConfig::default();
        let selector = ModelSelector::new(&fitter, &corpora, "A", &config).unwrap();
        assert!(selector.select_constant().is_none());
    }
}
