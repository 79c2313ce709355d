use server_api::ApiContext;
use shared::protocol::WorkOrderEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) api: ApiContext,
    pub(crate) events: broadcast::Sender<WorkOrderEvent>,
}

impl AppState {
    pub(crate) fn new(api: ApiContext) -> Self {
        let (events, _) = broadcast::channel(256);
        Self { api, events }
    }

    /// Fire-and-forget; having no subscribers is not an error.
    pub(crate) fn publish(&self, event: WorkOrderEvent) {
        let _ = self.events.send(event);
    }
}
