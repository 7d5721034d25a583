/*!
Reactive signals for the Docket client cache.

A [`Mut`] owns a value and is the only way to change it. Any number of [`Read`] handles can be
derived from it; they observe the present value and can subscribe to future values. Listeners are
plain closures or channel senders, and stay registered for as long as their guard is alive.

```rust
use docket_signals::*;

let count = Mut::new(1);
let read = count.read();
let _guard = read.subscribe(|value: std::sync::Arc<i32>| println!("count is now {value}"));
count.set(2);
assert_eq!(*read.get(), 2);
```
*/

pub mod broadcast;
mod signal;
mod subscribe;

pub use broadcast::{Broadcast, BroadcastId, IntoListener, Listener, ListenerGuard};
pub use signal::*;
pub use subscribe::*;
