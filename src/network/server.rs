use crate::core::{Block, Transaction};
use crate::error::{ErrorKind, LedgerError, Result};
use crate::ledger::LedgerHandle;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use serde_json::Deserializer;
use std::io::{BufReader, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

const TCP_WRITE_TIMEOUT: u64 = 5000;
const TCP_READ_TIMEOUT: u64 = 60_000;

/// Requests accepted by a ledger node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    /// Build a transfer by coin selection and submit it
    Send { from: String, to: String, value: u64 },
    /// Submit a transaction built elsewhere, exactly as given
    Submit { transaction: Transaction },
    /// Offer a candidate chain for replacement
    ProposeChain { blocks: Vec<Block> },
    GetChain,
    GetBalance { account: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Response {
    Accepted { block: Block },
    Rejected { kind: ErrorKind, message: String },
    ChainProposal { replaced: bool },
    Chain { blocks: Vec<Block> },
    Balance { account: String, balance: u128 },
}

impl Request {
    fn name(&self) -> &'static str {
        match self {
            Request::Send { .. } => "Send",
            Request::Submit { .. } => "Submit",
            Request::ProposeChain { .. } => "ProposeChain",
            Request::GetChain => "GetChain",
            Request::GetBalance { .. } => "GetBalance",
        }
    }
}

impl From<LedgerError> for Response {
    fn from(err: LedgerError) -> Self {
        Response::Rejected {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// TCP front end of a ledger node. Each connection gets its own thread and may
/// carry any number of JSON requests, answered in order.
pub struct Server {
    ledger: LedgerHandle,
}

impl Server {
    pub fn new(ledger: LedgerHandle) -> Self {
        Self { ledger }
    }

    /// Bind `addr` and serve until the listener fails
    pub fn run(&self, addr: &str) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| LedgerError::Network(format!("Failed to bind to {addr}: {e}")))?;

        info!("Server listening on {addr}");
        self.serve(listener)
    }

    /// Accept connections on an already bound listener
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    let peer_addr = match stream.peer_addr() {
                        Ok(addr) => addr,
                        Err(e) => {
                            error!("Failed to get peer address: {e}");
                            continue;
                        }
                    };

                    let ledger = self.ledger.clone();
                    thread::spawn(move || {
                        if let Err(e) = Self::handle_connection(&ledger, stream, peer_addr) {
                            error!("Error handling connection from {peer_addr}: {e}");
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {e}");
                }
            }
        }

        Ok(())
    }

    fn handle_connection(
        ledger: &LedgerHandle,
        stream: TcpStream,
        peer_addr: SocketAddr,
    ) -> Result<()> {
        stream
            .set_read_timeout(Some(Duration::from_millis(TCP_READ_TIMEOUT)))
            .map_err(|e| LedgerError::Network(format!("Failed to set read timeout: {e}")))?;

        let reader = BufReader::new(&stream);
        let requests = Deserializer::from_reader(reader).into_iter::<Request>();
        let mut writer = &stream;

        for request in requests {
            let request = request.map_err(|e| {
                LedgerError::Network(format!("Failed to deserialize request: {e}"))
            })?;

            info!("Received {} request from {peer_addr}", request.name());
            let response = Self::process_request(ledger, request);
            debug!("Responding to {peer_addr}: {response:?}");

            serde_json::to_writer(&mut writer, &response)
                .map_err(|e| LedgerError::Network(format!("Failed to send response: {e}")))?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }

        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }

    fn process_request(ledger: &LedgerHandle, request: Request) -> Response {
        match request {
            Request::Send { from, to, value } => ledger
                .new_transaction(value, &from, &to)
                .and_then(|transaction| ledger.submit_and_wait(transaction))
                .map(|block| Response::Accepted { block })
                .unwrap_or_else(Response::from),
            Request::Submit { transaction } => ledger
                .submit_and_wait(transaction)
                .map(|block| Response::Accepted { block })
                .unwrap_or_else(Response::from),
            Request::ProposeChain { blocks } => ledger
                .propose_chain(blocks)
                .map(|replaced| Response::ChainProposal { replaced })
                .unwrap_or_else(Response::from),
            Request::GetChain => Response::Chain {
                blocks: ledger.current_chain().to_vec(),
            },
            Request::GetBalance { account } => {
                let balance = ledger.balance_of(&account);
                Response::Balance { account, balance }
            }
        }
    }
}

/// Send one request to the node at `addr` and wait for its response
pub fn send_request(addr: &str, request: &Request) -> Result<Response> {
    let socket_addr = addr
        .to_socket_addrs()
        .map_err(|e| LedgerError::Network(format!("Invalid address {addr}: {e}")))?
        .next()
        .ok_or_else(|| LedgerError::Network(format!("Invalid address {addr}")))?;

    let stream =
        TcpStream::connect_timeout(&socket_addr, Duration::from_millis(TCP_WRITE_TIMEOUT))
            .map_err(|e| LedgerError::Network(format!("Failed to connect to {addr}: {e}")))?;

    stream
        .set_write_timeout(Some(Duration::from_millis(TCP_WRITE_TIMEOUT)))
        .map_err(|e| LedgerError::Network(format!("Failed to set write timeout: {e}")))?;

    serde_json::to_writer(&stream, request)
        .map_err(|e| LedgerError::Network(format!("Failed to send request: {e}")))?;
    stream
        .shutdown(Shutdown::Write)
        .map_err(|e| LedgerError::Network(format!("Failed to finish request: {e}")))?;

    Deserializer::from_reader(BufReader::new(&stream))
        .into_iter::<Response>()
        .next()
        .ok_or_else(|| LedgerError::Network(format!("{addr} closed without responding")))?
        .map_err(|e| LedgerError::Network(format!("Failed to read response: {e}")))
}
