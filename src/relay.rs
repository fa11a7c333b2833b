// WebSocket relay: accepts draft clients, routes their requests into the
// engine, and pushes invalidation plus fresh boards back out.
//
// Message handling is split from the socket plumbing: [`Connection`] is pure
// request/response logic over in-memory state and is the unit-test target;
// the async functions below only move frames.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::db::Database;
use crate::draft::{autopick, commit, pool, turn};
use crate::identity::Principal;
use crate::protocol::{ClientMessage, RejectReason, ServerMessage};
use crate::session::{DraftSession, ViewUpdate};
use crate::sync::ChangeFeed;

/// What the socket layer must do after a handled message.
#[derive(Debug, PartialEq)]
pub enum Action {
    None,
    /// Start (or replace) the board session for this game.
    Subscribe(i64),
}

/// Per-connection request handler. Holds the caller's identity once the
/// `hello` arrives; everything before that is refused.
pub struct Connection {
    db: Arc<Database>,
    feed: ChangeFeed,
    principal: Option<Principal>,
}

impl Connection {
    pub fn new(db: Arc<Database>, feed: ChangeFeed) -> Self {
        Connection {
            db,
            feed,
            principal: None,
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.principal.as_ref()
    }

    /// Handle one text frame, returning the replies to send and any
    /// follow-up action for the socket layer.
    pub fn handle_text(&mut self, text: &str) -> (Vec<ServerMessage>, Action) {
        let msg: ClientMessage = match serde_json::from_str(text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(error = %e, "unparseable client message");
                return (
                    vec![ServerMessage::Error {
                        detail: format!("bad message: {e}"),
                    }],
                    Action::None,
                );
            }
        };

        if let ClientMessage::Hello {
            parent_id,
            is_commissioner,
        } = &msg
        {
            info!(parent_id = %parent_id, is_commissioner, "client identified");
            let welcome = ServerMessage::Welcome {
                parent_id: parent_id.clone(),
            };
            self.principal = Some(Principal {
                parent_id: parent_id.clone(),
                is_commissioner: *is_commissioner,
            });
            return (vec![welcome], Action::None);
        }

        let Some(caller) = self.principal.clone() else {
            return (
                vec![ServerMessage::Error {
                    detail: "identify with hello first".to_string(),
                }],
                Action::None,
            );
        };

        match msg {
            ClientMessage::Hello { .. } => unreachable!("handled above"),
            ClientMessage::Subscribe { game_id } => (vec![], Action::Subscribe(game_id)),
            ClientMessage::CommitPick {
                game_id,
                player_id,
                force_for,
            } => {
                let reply = match commit::commit_pick(
                    &self.db,
                    &self.feed,
                    game_id,
                    player_id,
                    &caller,
                    force_for.as_deref(),
                ) {
                    Ok(pick) => ServerMessage::PickCommitted { pick },
                    Err(e) => ServerMessage::rejected(&e),
                };
                (vec![reply], Action::None)
            }
            ClientMessage::AutoPick { game_id } => {
                (vec![self.auto_pick(game_id, &caller)], Action::None)
            }
        }
    }

    /// Commit the best legal pick for whoever is on the clock. A caller who
    /// is not that parent goes through the commissioner-override path, so
    /// ordinary parents can only auto-pick for themselves.
    fn auto_pick(&self, game_id: i64, caller: &Principal) -> ServerMessage {
        let current = match (
            self.db.load_draft_order(game_id),
            self.db.pick_count(game_id),
        ) {
            (Ok(order), Ok(count)) => turn::project(&order, count),
            (Err(e), _) | (_, Err(e)) => {
                return ServerMessage::Error {
                    detail: e.to_string(),
                }
            }
        };

        let Some(picker) = current.picker else {
            return ServerMessage::PickRejected {
                reason: RejectReason::NoActivePicker,
                detail: "no draft order is configured for this game".to_string(),
            };
        };

        let board = match pool::resolve(&self.db, game_id, &Principal::parent(picker.as_str())) {
            Ok(board) => board,
            Err(e) => {
                return ServerMessage::Error {
                    detail: e.to_string(),
                }
            }
        };

        let Some(candidate) = autopick::best_available(&board) else {
            return ServerMessage::PickRejected {
                reason: RejectReason::NoLegalCandidate,
                detail: format!("no legal candidate remains for {picker}"),
            };
        };

        let force_for = (caller.parent_id != picker).then_some(picker.as_str());
        match commit::commit_pick(
            &self.db,
            &self.feed,
            game_id,
            candidate.player.id,
            caller,
            force_for,
        ) {
            Ok(pick) => ServerMessage::PickCommitted { pick },
            Err(e) => ServerMessage::rejected(&e),
        }
    }
}

/// Accept connections forever, one task per client.
pub async fn run(
    listener: TcpListener,
    db: Arc<Database>,
    feed: ChangeFeed,
) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("draft relay listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        info!("accepted connection from {addr}");
        tokio::spawn(handle_connection(
            stream,
            addr.to_string(),
            db.clone(),
            feed.clone(),
        ));
    }
}

async fn handle_connection(stream: TcpStream, addr: String, db: Arc<Database>, feed: ChangeFeed) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake failed for {addr}: {e}");
            return;
        }
    };
    let (mut write, mut read) = ws.split();

    let mut conn = Connection::new(db.clone(), feed.clone());
    let (update_tx, mut update_rx) = mpsc::channel::<ViewUpdate>(8);
    let mut session_task: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                None => break,
                Some(Ok(Message::Text(text))) => {
                    let (replies, action) = conn.handle_text(&text);
                    if send_all(&mut write, replies).await.is_err() {
                        break;
                    }
                    if let Action::Subscribe(game_id) = action {
                        // Subscribe is only reachable after hello.
                        let Some(viewer) = conn.principal().cloned() else {
                            break;
                        };
                        if let Some(task) = session_task.take() {
                            task.abort();
                        }
                        let session = DraftSession::new(db.clone(), game_id, viewer);
                        session_task = Some(tokio::spawn(
                            session.run(feed.subscribe(game_id), update_tx.clone()),
                        ));
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    info!("client {addr} sent close frame");
                    break;
                }
                Some(Err(e)) => {
                    warn!("websocket error from {addr}: {e}");
                    break;
                }
                _ => {
                    // Ignore Binary, Ping, Pong, Frame variants.
                }
            },
            update = update_rx.recv() => {
                // The channel never closes while we hold update_tx.
                let Some(update) = update else { break };
                let msg = match update {
                    ViewUpdate::Pick(event) => ServerMessage::PickInserted { event },
                    ViewUpdate::Board(board) => ServerMessage::Board { board },
                    ViewUpdate::Unavailable(detail) => ServerMessage::Error { detail },
                };
                if send_all(&mut write, vec![msg]).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(task) = session_task.take() {
        task.abort();
    }
    info!("client {addr} disconnected");
}

async fn send_all<S>(write: &mut S, messages: Vec<ServerMessage>) -> Result<(), ()>
where
    S: futures_util::Sink<Message> + Unpin,
{
    for msg in messages {
        let json = match serde_json::to_string(&msg) {
            Ok(json) => json,
            Err(e) => {
                warn!("failed to encode server message: {e}");
                continue;
            }
        };
        if write.send(Message::Text(json.into())).await.is_err() {
            return Err(());
        }
    }
    Ok(())
}
