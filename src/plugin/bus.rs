use std::sync::Arc;

/// Subscriptions keyed by (plugin, event type), kept in subscription order.
#[derive(Clone, Debug, Default)]
pub(crate) struct EventBus {
    subscriptions: Vec<(Arc<str>, String)>,
}

impl EventBus {
    pub(crate) fn on(&mut self, plugin: &Arc<str>, kind: &str) -> bool {
        if self.is_subscribed(plugin, kind) {
            return false;
        }
        self.subscriptions.push((Arc::clone(plugin), kind.to_owned()));
        true
    }

    pub(crate) fn off(&mut self, plugin: &str, kind: &str) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions
            .retain(|(p, k)| !(p.as_ref() == plugin && k == kind));
        self.subscriptions.len() != before
    }

    pub(crate) fn remove_plugin(&mut self, plugin: &str) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|(p, _)| p.as_ref() != plugin);
        before - self.subscriptions.len()
    }

    pub(crate) fn is_subscribed(&self, plugin: &str, kind: &str) -> bool {
        self.subscriptions
            .iter()
            .any(|(p, k)| p.as_ref() == plugin && k == kind)
    }

    pub(crate) fn subscribers<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.subscriptions
            .iter()
            .filter(move |(_, k)| k == kind)
            .map(|(p, _)| p.as_ref())
    }

    pub(crate) fn subscriptions_of(&self, plugin: &str) -> usize {
        self.subscriptions
            .iter()
            .filter(|(p, _)| p.as_ref() == plugin)
            .count()
    }
}
