// SPDX-License-Identifier: LGPL-3.0-or-later OR MPL-2.0
// This file is a part of `font-chars`.
//
// `font-chars` is free software: you can redistribute it and/or modify it under the
// terms of either:
//
// * GNU Lesser General Public License as published by the Free Software Foundation, either
//   version 3 of the License, or (at your option) any later version.
// * Mozilla Public License as published by the Mozilla Foundation, version 2.
//
// `font-chars` is distributed in the hope that it will be useful, but WITHOUT ANY
// WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR
// PURPOSE. See the GNU Lesser General Public License or the Mozilla Public License for more
// details.
//
// You should have received a copy of the GNU Lesser General Public License and the Mozilla
// Public License along with `font-chars`. If not, see <https://www.gnu.org/licenses/>.

//! Tiny oneshot channel used to hand the loaded font system back from its loader.
//!
//! Using this means we don't have to take a dependency on `async-channel`.

use event_listener::Event;

use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};

/// Create a new channel.
pub(crate) fn channel<T>() -> (Sender<T>, Receiver<T>) {
    let channel = Arc::new(Channel {
        val: Mutex::new(State::Empty),
        waker: Event::new(),
    });
    (Sender(channel.clone()), Receiver(channel))
}

/// The sender went away without sending a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Closed;

/// The sender side of the channel.
pub(crate) struct Sender<T>(Arc<Channel<T>>);

impl<T> Sender<T> {
    /// Send a value, consuming the sender.
    pub(crate) fn send(self, val: T) {
        *self.0.lock() = State::Full(val);
        self.0.waker.notify(1);
    }
}

impl<T> Drop for Sender<T> {
    fn drop(&mut self) {
        let mut lock = self.0.lock();
        if let State::Empty = &*lock {
            *lock = State::Closed;
            drop(lock);
            self.0.waker.notify(1);
        }
    }
}

/// The receiver side of the channel.
pub(crate) struct Receiver<T>(Arc<Channel<T>>);

impl<T> Receiver<T> {
    /// Try to receive a value without waiting.
    pub(crate) fn try_recv(&self) -> Result<Option<T>, Closed> {
        let mut lock = self.0.lock();
        match mem::replace(&mut *lock, State::Empty) {
            State::Full(val) => Ok(Some(val)),
            State::Empty => Ok(None),
            State::Closed => {
                *lock = State::Closed;
                Err(Closed)
            }
        }
    }

    /// Wait for a value.
    pub(crate) async fn recv(&self) -> Result<T, Closed> {
        loop {
            if let Some(value) = self.try_recv()? {
                return Ok(value);
            }

            // Register a listener, then check again so a send in between is not missed.
            let listener = self.0.waker.listen();

            if let Some(value) = self.try_recv()? {
                return Ok(value);
            }

            listener.await;
        }
    }

    /// Wait for a value, blocking edition.
    pub(crate) fn recv_blocking(&self) -> Result<T, Closed> {
        loop {
            if let Some(value) = self.try_recv()? {
                return Ok(value);
            }

            let listener = self.0.waker.listen();

            if let Some(value) = self.try_recv()? {
                return Ok(value);
            }

            listener.wait();
        }
    }
}

/// The inner channel object.
struct Channel<T> {
    /// The value.
    val: Mutex<State<T>>,

    /// Wakes up when a value is pushed or the sender is dropped.
    waker: Event,
}

impl<T> Channel<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // The state is always valid, even if a holder panicked.
        self.val.lock().unwrap_or_else(|poison| poison.into_inner())
    }
}

/// State of the channel.
enum State<T> {
    /// Nothing sent yet.
    Empty,

    /// The channel has a value.
    Full(T),

    /// The sender was dropped without sending.
    Closed,
}
