//! Encrypted sessions between two addresses
//!
//! A session is negotiated entirely through `COMMUN` messages on the ledger:
//!
//! 1. The initiator publishes a freshly generated DH group (`der`) and its
//!    public key.
//! 2. The counterparty echoes its own public key under the same group.
//! 3. Both sides derive the shared secret; its first 32 bytes key AES-256-CBC
//!    for every later line of the conversation.
//!
//! Re-initiating an authenticated session starts a new key exchange; lines
//! sent before it stay readable only with the old key.
//!
//! Internal module boundaries:
//! - `cipher`: AES-256-CBC helpers and crypto errors
//! - `dh`: DH group parameters, DER handling and key agreement

pub mod cipher;
pub mod dh;

use std::cell::OnceCell;

use num_bigint::BigUint;
use thiserror::Error;
use tracing::debug;

use crate::ledger::Ledger;
use crate::market::{Market, MarketError, MessageQuery};
use crate::message::{Communication, Message, MessageType, ValidationErrors};

pub use cipher::{CryptoError, IV_LEN, KEY_LEN};
pub use dh::DhParams;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is not authenticated")]
    Unauthenticated,
    #[error("DH parameters were already established by the initiator")]
    ParametersAlreadyEstablished,
    #[error("anchor is not an initiation addressed to this party")]
    InvalidSession,
    #[error("session has no receiver")]
    MissingReceiver,
    #[error("invalid communication: {0}")]
    InvalidCommunication(ValidationErrors),
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error(transparent)]
    Market(#[from] MarketError),
}

pub type Result<T> = std::result::Result<T, SessionError>;

pub struct Session<'a, L: Ledger> {
    market: &'a Market<L>,
    private_key: String,
    secret: BigUint,
    sender_addr: String,
    receiver_addr: String,
    end_block: Option<u64>,
    symm_key: OnceCell<Vec<u8>>,
}

impl<'a, L: Ledger> Session<'a, L> {
    /// Open a new conversation with `receiver_addr`.
    pub fn new(
        market: &'a Market<L>,
        private_key: &str,
        session_secret: &str,
        receiver_addr: &str,
    ) -> Result<Self> {
        if receiver_addr.is_empty() {
            return Err(SessionError::MissingReceiver);
        }
        Self::build(market, private_key, session_secret, receiver_addr.to_string())
    }

    /// Join the conversation started by `anchor`, an initiation addressed to
    /// the owner of `private_key`.
    pub fn with(
        market: &'a Market<L>,
        private_key: &str,
        session_secret: &str,
        anchor: &Message,
    ) -> Result<Self> {
        let receiver_addr = anchor
            .sender_addr
            .clone()
            .ok_or(SessionError::MissingReceiver)?;
        let session = Self::build(market, private_key, session_secret, receiver_addr)?;

        let is_init = anchor.as_communication().is_some_and(Communication::is_init);
        if !is_init || anchor.receiver_addr.as_deref() != Some(session.sender_addr.as_str()) {
            return Err(SessionError::InvalidSession);
        }
        Ok(session)
    }

    fn build(
        market: &'a Market<L>,
        private_key: &str,
        session_secret: &str,
        receiver_addr: String,
    ) -> Result<Self> {
        Ok(Self {
            market,
            private_key: private_key.to_string(),
            secret: dh::parse_secret(session_secret)?,
            sender_addr: market.address_for_private_key(private_key)?,
            receiver_addr,
            end_block: None,
            symm_key: OnceCell::new(),
        })
    }

    /// Ignore anything confirmed after `block`.
    pub fn with_end_block(mut self, block: u64) -> Self {
        self.end_block = Some(block);
        self
    }

    pub fn sender_addr(&self) -> &str {
        &self.sender_addr
    }

    pub fn receiver_addr(&self) -> &str {
        &self.receiver_addr
    }

    /// Every initiation sent to or from `addr`, newest first.
    pub fn all(market: &Market<L>, addr: &str) -> Result<Vec<Message>> {
        let query = MessageQuery::new().of_type(MessageType::Communication);
        Ok(market
            .messages_by_addr(addr, &query)?
            .into_iter()
            .filter(|message| message.as_communication().is_some_and(Communication::is_init))
            .collect())
    }

    fn commun_messages(&self, start_block: Option<u64>) -> Result<Vec<Message>> {
        let query = MessageQuery {
            message_type: Some(MessageType::Communication),
            start_block,
            end_block: self.end_block,
            between: Some((self.sender_addr.clone(), self.receiver_addr.clone())),
        };
        Ok(self.market.messages_by_addr(&self.sender_addr, &query)?)
    }

    /// Newest initiation between the pair.
    pub fn communication_init(&self) -> Result<Option<Message>> {
        Ok(self
            .commun_messages(None)?
            .into_iter()
            .find(|message| message.as_communication().is_some_and(Communication::is_init)))
    }

    /// Newest echo, provided no initiation is newer than it.
    pub fn communication_auth(&self) -> Result<Option<Message>> {
        for message in self.commun_messages(None)? {
            let Some(communication) = message.as_communication() else {
                continue;
            };
            if communication.is_init() {
                return Ok(None);
            }
            if communication.is_auth() {
                return Ok(Some(message));
            }
        }
        Ok(None)
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.communication_init()?.is_some() && self.communication_auth()?.is_some())
    }

    /// Publish this side's public key.
    ///
    /// Starts a new exchange when none exists or the current one is complete,
    /// using `der` or a freshly generated group of the configured size.
    /// Otherwise answers the peer's initiation under its group, and `der`
    /// must be `None`.
    pub fn authenticate(&mut self, der: Option<&[u8]>) -> Result<String> {
        let init = self.communication_init()?;
        let is_init = init.is_none() || self.is_authenticated()?;

        let (params, published_der) = if is_init {
            let params = match der {
                Some(der) => DhParams::from_der(der)?,
                None => {
                    let bits = self.market.config().dh_prime_bits;
                    debug!(bits, receiver = %self.receiver_addr, "generating DH group");
                    DhParams::generate(bits)?
                }
            };
            let encoded = params.to_der();
            (params, Some(encoded))
        } else {
            if der.is_some() {
                return Err(SessionError::ParametersAlreadyEstablished);
            }
            let anchor_der = init
                .as_ref()
                .and_then(Message::as_communication)
                .and_then(|communication| communication.der.as_deref())
                .ok_or(SessionError::InvalidSession)?;
            (DhParams::from_der(anchor_der)?, None)
        };

        let session_pkey = params.public_key(&self.secret);
        let communication = match published_der {
            Some(der) => Communication::init(der, session_pkey),
            None => Communication::auth(session_pkey),
        };

        let txid = self.communicate(communication)?;
        self.symm_key = OnceCell::new();
        debug!(%txid, sender = %self.sender_addr, receiver = %self.receiver_addr, is_init, "published session key");
        Ok(txid)
    }

    /// AES key for the current exchange, or `None` until both keys are out.
    pub fn symm_key(&self) -> Result<Option<&[u8]>> {
        if let Some(key) = self.symm_key.get() {
            return Ok(Some(key.as_slice()));
        }

        let (Some(init), Some(auth)) = (self.communication_init()?, self.communication_auth()?)
        else {
            return Ok(None);
        };

        let their_pkey = [&init, &auth]
            .into_iter()
            .find(|message| {
                message.sender_addr.as_deref() == Some(self.receiver_addr.as_str())
                    && message.receiver_addr.as_deref() == Some(self.sender_addr.as_str())
            })
            .and_then(Message::as_communication)
            .and_then(|communication| communication.session_pkey.as_deref());
        let Some(their_pkey) = their_pkey else {
            debug!(receiver = %self.receiver_addr, "no session key from counterparty");
            return Ok(None);
        };

        let der = init
            .as_communication()
            .and_then(|communication| communication.der.as_deref())
            .ok_or(SessionError::InvalidSession)?;
        let params = DhParams::from_der(der)?;
        let mut shared = params.shared_secret(&self.secret, their_pkey)?;
        shared.truncate(KEY_LEN);
        debug!(sender = %self.sender_addr, receiver = %self.receiver_addr, "derived session key");

        Ok(Some(self.symm_key.get_or_init(|| shared).as_slice()))
    }

    /// Encrypt and post a line. A fixed `iv` is for deterministic tests.
    pub fn send(&self, plaintext: &[u8], iv: Option<[u8; IV_LEN]>) -> Result<String> {
        if !self.is_authenticated()? {
            return Err(SessionError::Unauthenticated);
        }
        let key = self.symm_key()?.ok_or(SessionError::Unauthenticated)?;

        let iv = iv.unwrap_or_else(cipher::random_iv);
        let contents = cipher::encrypt(key, &iv, plaintext)?;
        self.communicate(Communication::encrypted(iv.to_vec(), contents))
    }

    /// Lines exchanged since the current initiation, oldest first, each with
    /// the session key attached. Empty until authenticated.
    pub fn communications(&self) -> Result<Vec<Message>> {
        let Some(init) = self.communication_init()? else {
            return Ok(Vec::new());
        };
        if self.communication_auth()?.is_none() {
            return Ok(Vec::new());
        }
        let key = self.symm_key()?.map(<[u8]>::to_vec);
        let position =
            |message: &Message| (message.block_height.unwrap_or(u64::MAX), message.sequence);
        let started = position(&init);

        let mut lines: Vec<Message> = self
            .commun_messages(init.block_height)?
            .into_iter()
            .filter(|message| position(message) > started)
            .filter(|message| {
                message
                    .as_communication()
                    .is_some_and(|communication| !communication.is_auth())
            })
            .collect();
        for line in &mut lines {
            if let Some(communication) = line.as_communication_mut() {
                communication.symm_key.clone_from(&key);
            }
        }
        lines.sort_by_key(position);
        Ok(lines)
    }

    fn communicate(&self, communication: Communication) -> Result<String> {
        let message = Message::new(communication)
            .with_sender(self.sender_addr.clone())
            .with_receiver(self.receiver_addr.clone());

        let errors = self.market.validate(&message);
        if !errors.is_empty() {
            return Err(SessionError::InvalidCommunication(errors));
        }
        Ok(self.market.save(&message, &self.private_key)?)
    }
}
