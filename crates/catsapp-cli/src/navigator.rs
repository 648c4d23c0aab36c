use catsapp_core::{Navigator, Route};
use tracing::debug;

/// Turns navigation requests from the core into hints on stderr.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        debug!(path = route.path(), "Navigation requested");
        match route {
            Route::Login => eprintln!("Signed out. Run `catsapp login` to sign in."),
            Route::Dashboard => eprintln!("Signed in. Run `catsapp breeds` to browse the catalog."),
        }
    }
}
