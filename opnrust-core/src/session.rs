//! Request/response exchanges over a byte stream
//!
//! A session is strictly half-duplex: a request is written in full, then
//! exactly one response frame is read before anything else may be sent.
//! Every method takes `&mut self`, so the borrow checker rules out a second
//! exchange starting while one is in flight.

use std::io::{Read, Write};

use tracing::{debug, trace};

use crate::{
    error::Result,
    frame::Frame,
    message::{Request, Response},
    opcode::Opcode,
};

/// Protocol session over a blocking duplex stream
///
/// The stream may be owned (`Box<dyn SerialPort>`) or borrowed
/// (`&mut SerialTransport`); the session never opens or closes it.
///
/// # Examples
///
/// ```no_run
/// use opnrust_core::{Request, Response, Session};
/// # fn port() -> std::net::TcpStream { unimplemented!() }
///
/// let mut session = Session::new(port());
/// let response = session.exchange(&Request::Interrogate)?;
///
/// if let Response::Interrogate(info) = response {
///     println!("device {:016X}", info.device_id);
/// }
/// # Ok::<(), opnrust_core::Error>(())
/// ```
#[derive(Debug)]
pub struct Session<S> {
    stream: S,
    exchanges: u64,
}

impl<S: Read + Write> Session<S> {
    /// Start a session on an open stream
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            exchanges: 0,
        }
    }

    /// Number of exchanges completed successfully
    pub fn exchanges(&self) -> u64 {
        self.exchanges
    }

    /// Write one request frame
    pub fn send(&mut self, request: &Request) -> Result<()> {
        let data = request.encode()?;

        debug!("Sending {}", request.opcode());
        trace!("Sending {} bytes: {}", data.len(), hex::encode(&data));

        self.stream.write_all(&data)?;
        self.stream.flush()?;

        Ok(())
    }

    /// Read the response to a request with the given opcode
    pub fn receive(&mut self, opcode: Opcode) -> Result<Response> {
        let response = Response::read_from(opcode, &mut self.stream)?;
        trace!("Received: {:?}", response);
        Ok(response)
    }

    /// Read one generic frame without interpreting its payload
    pub fn receive_frame(&mut self) -> Result<Frame> {
        Frame::read_from(&mut self.stream)
    }

    /// Send a request and block until its response arrives
    ///
    /// Errors are returned as soon as they occur; nothing is retried.
    pub fn exchange(&mut self, request: &Request) -> Result<Response> {
        self.send(request)?;
        let response = self.receive(request.opcode())?;

        self.exchanges += 1;
        debug!(
            exchanges = self.exchanges,
            "Exchange complete: {}",
            request.opcode()
        );

        Ok(response)
    }

    /// Borrow the stream
    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Mutably borrow the stream
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Give the stream back
    pub fn into_inner(self) -> S {
        self.stream
    }
}
