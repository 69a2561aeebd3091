//! Room actor: an isolated Tokio task that owns a room's state.
//!
//! Each room runs in its own task, communicating with the outside world
//! through a bounded mpsc mailbox. Commands are handled strictly one at a
//! time in arrival order, and each one is answered exactly once on its
//! own oneshot channel. No shared mutable state, just message passing.

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use wayfarer_protocol::{PlayerId, Reply, RoomId};
use wayfarer_world::Player;

use crate::combat::CombatState;
use crate::command::Command;
use crate::persistence::{RoomStore, SavedRoom};
use crate::state::Room;
use crate::{RoomConfig, RoomError, Verb};

/// Commands sent to a room actor through its mailbox.
///
/// Lifecycle requests share the mailbox with player verbs so they are
/// ordered with respect to them.
pub(crate) enum RoomCommand {
    /// A player verb.
    Command(Command),

    /// Add a player to the room.
    Join {
        player: Player,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player from the room.
    Leave {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<Departure, RoomError>>,
    },

    /// Request room metadata.
    Info { reply: oneshot::Sender<RoomInfo> },

    /// Persist the room now.
    Save { reply: oneshot::Sender<()> },

    /// Persist everything and stop.
    Shutdown { reply: oneshot::Sender<()> },
}

/// A snapshot of room metadata (not the world itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    /// The room's unique ID.
    pub room_id: RoomId,
    /// Number of players currently in the room.
    pub player_count: usize,
    /// Maximum players allowed.
    pub max_players: usize,
    /// Content id of the party's current location.
    pub location: String,
    /// Whether a travel vote is open.
    pub voting: bool,
    /// Whether the party is fighting.
    pub combat: CombatState,
    /// Id of the newest history message.
    pub message_count: u64,
}

/// What a room hands back when a player leaves.
#[derive(Debug)]
pub struct Departure {
    /// The player as they left, already persisted.
    pub player: Player,
    /// Players still in the room. Zero means the room has saved itself
    /// and stopped.
    pub remaining: usize,
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it wraps an `mpsc::Sender`.
/// The `RoomManager` holds one of these per room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// Whether both handles talk to the same actor. A reopened room has
    /// the same id but a new actor.
    pub fn is_same(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    /// Submits a verb and waits for its reply.
    ///
    /// Game-level failures come back as [`Reply::Null`], never as an
    /// error. `Err` only means the actor is gone.
    pub async fn submit(
        &self,
        player: PlayerId,
        verb: Verb,
        param: &str,
    ) -> Result<Reply, RoomError> {
        let param = param.to_string();
        self.request(|reply| {
            RoomCommand::Command(Command {
                player,
                verb,
                param,
                reply,
            })
        })
        .await
    }

    /// Sends a join request to the room.
    pub async fn join(&self, player: Player) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Join { player, reply })
            .await?
    }

    /// Sends a leave request to the room.
    pub async fn leave(&self, player_id: PlayerId) -> Result<Departure, RoomError> {
        self.request(|reply| RoomCommand::Leave { player_id, reply })
            .await?
    }

    /// Requests the current room info.
    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::Info { reply }).await
    }

    /// Asks the room to persist itself. Write failures are logged by the
    /// room, not reported here.
    pub async fn save(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Save { reply }).await
    }

    /// Tells the room to save and stop, and waits until it has.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.request(|reply| RoomCommand::Shutdown { reply }).await
    }

    /// Sends a command carrying a fresh reply channel and awaits the
    /// answer. A full mailbox makes this wait.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(make(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id.clone()))
    }
}

/// The internal room actor. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until shutdown or until
    /// the last player leaves.
    async fn run(mut self) {
        let room_id = self.room.id().clone();
        tracing::info!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Command(Command {
                    player,
                    verb,
                    param,
                    reply,
                }) => {
                    let out = self.room.process(player, verb, &param, Instant::now());
                    let _ = reply.send(out);
                }
                RoomCommand::Join { player, reply } => {
                    let _ = reply.send(self.room.join(player));
                }
                RoomCommand::Leave { player_id, reply } => {
                    let result = self.room.leave(player_id).map(|player| Departure {
                        player,
                        remaining: self.room.player_count(),
                    });
                    let closing = result.is_ok() && self.room.is_empty();
                    if closing {
                        tracing::info!(%room_id, "last player left, closing room");
                        self.room.save();
                    }
                    let _ = reply.send(result);
                    if closing {
                        break;
                    }
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.room.info());
                }
                RoomCommand::Save { reply } => {
                    self.room.save();
                    let _ = reply.send(());
                }
                RoomCommand::Shutdown { reply } => {
                    tracing::info!(%room_id, "room shutting down");
                    self.room.save_everything();
                    let _ = reply.send(());
                    break;
                }
            }
        }

        self.drain();
        tracing::info!(%room_id, "room actor stopped");
    }

    /// Answers whatever is still queued after the loop ends so no
    /// submitter is left without a reply.
    fn drain(&mut self) {
        self.receiver.close();
        while let Ok(cmd) = self.receiver.try_recv() {
            let room_id = self.room.id().clone();
            match cmd {
                RoomCommand::Command(command) => {
                    let _ = command.reply.send(Reply::Null);
                }
                RoomCommand::Join { reply, .. } => {
                    let _ = reply.send(Err(RoomError::Unavailable(room_id)));
                }
                RoomCommand::Leave { reply, .. } => {
                    let _ = reply.send(Err(RoomError::Unavailable(room_id)));
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.room.info());
                }
                RoomCommand::Save { reply } | RoomCommand::Shutdown { reply } => {
                    let _ = reply.send(());
                }
            }
        }
    }
}

/// Spawns a room actor task and returns a handle to communicate with it.
///
/// `config.mailbox_size` controls backpressure: if the mailbox fills
/// up, senders wait (bounded channel).
pub fn spawn_room(saved: SavedRoom, config: RoomConfig, store: RoomStore) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_size.max(1));
    let room_id = saved.id.clone();

    let actor = RoomActor {
        room: Room::restore(saved, config, store),
        receiver: rx,
    };
    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
