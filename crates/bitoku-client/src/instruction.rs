//! Bitoku program instruction encoding.
//!
//! Every instruction is a one-byte opcode followed by fixed-width fields.
//! Multi-byte integers are little-endian, enums are a single byte and
//! `Name`/`Data` always occupy their full padded width, so the payload
//! length is a function of the opcode alone.
//!
//! | opcode | layout                                                          |
//! |--------|-----------------------------------------------------------------|
//! | 0      | `[0]`                                                           |
//! | 1      | `[1]`                                                           |
//! | 2      | `[2][client_id]`                                                |
//! | 3      | `[3][client_id][request_type][name:128][file_id][pos:8][data:512]` |

use solana_program::instruction::{AccountMeta, Instruction};
use solana_program::pubkey::Pubkey;
use solana_program::{system_program, sysvar};

use crate::constants::{DATA_LEN, NAME_LEN};
use crate::error::{BitokuError, BitokuResult};
use crate::pda;
use crate::types::{Data, Name};

pub const INITIALIZE_LEN: usize = 1;
pub const CREATE_CLIENT_ACCOUNT_LEN: usize = 1;
pub const DELETE_CLIENT_LEN: usize = 2;
pub const SEND_REQUEST_LEN: usize = 1 + 1 + 1 + NAME_LEN + 1 + 8 + DATA_LEN;

const _: () = assert!(SEND_REQUEST_LEN == 652);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    Initialize = 0,
    CreateClientAccount = 1,
    DeleteClient = 2,
    SendRequest = 3,
}

impl Opcode {
    pub fn from_u8(b: u8) -> Option<Self> {
        Some(match b {
            0 => Self::Initialize,
            1 => Self::CreateClientAccount,
            2 => Self::DeleteClient,
            3 => Self::SendRequest,
            _ => return None,
        })
    }

    /// Total payload length for this opcode.
    pub const fn payload_len(self) -> usize {
        match self {
            Self::Initialize => INITIALIZE_LEN,
            Self::CreateClientAccount => CREATE_CLIENT_ACCOUNT_LEN,
            Self::DeleteClient => DELETE_CLIENT_LEN,
            Self::SendRequest => SEND_REQUEST_LEN,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::CreateClientAccount => "create-client-account",
            Self::DeleteClient => "delete-client",
            Self::SendRequest => "send-request",
        }
    }
}

/// Sub-kind of a `SendRequest`, numbered as the program numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestType {
    CreateBucket = 0,
    CreateFile = 1,
    WriteFile = 2,
    CloseFile = 3,
    DeleteFile = 4,
    SetPosition = 5,
    OpenFile = 6,
    ReadFile = 7,
}

impl RequestType {
    pub fn from_u8(b: u8) -> Option<Self> {
        use RequestType::*;
        Some(match b {
            0 => CreateBucket,
            1 => CreateFile,
            2 => WriteFile,
            3 => CloseFile,
            4 => DeleteFile,
            5 => SetPosition,
            6 => OpenFile,
            7 => ReadFile,
            _ => return None,
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateBucket => "create-bucket",
            Self::CreateFile => "create-file",
            Self::WriteFile => "write-file",
            Self::CloseFile => "close-file",
            Self::DeleteFile => "delete-file",
            Self::SetPosition => "set-position",
            Self::OpenFile => "open-file",
            Self::ReadFile => "read-file",
        }
    }
}

/// Arguments of a `SendRequest`. All fields are always encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequestArgs {
    pub client_id: u8,
    pub request_type: RequestType,
    pub name: Name,
    pub file_id: u8,
    pub position: u64,
    pub data: Data,
}

impl SendRequestArgs {
    pub fn new(request_type: RequestType, name: Name) -> Self {
        Self {
            client_id: 0,
            request_type,
            name,
            file_id: 0,
            position: 0,
            data: Data::empty(),
        }
    }

    pub fn client_id(mut self, client_id: u8) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn file_id(mut self, file_id: u8) -> Self {
        self.file_id = file_id;
        self
    }

    pub fn position(mut self, position: u64) -> Self {
        self.position = position;
        self
    }

    pub fn data(mut self, data: Data) -> Self {
        self.data = data;
        self
    }

    fn write_to(&self, buf: &mut Vec<u8>) {
        buf.push(Opcode::SendRequest as u8);
        buf.push(self.client_id);
        buf.push(self.request_type as u8);
        buf.extend_from_slice(self.name.as_wire());
        buf.push(self.file_id);
        buf.extend_from_slice(&self.position.to_le_bytes());
        buf.extend_from_slice(self.data.as_wire());
    }

    fn read_from(body: &[u8]) -> BitokuResult<Self> {
        // body excludes the opcode byte
        let (client_id, rest) = split_u8(body)?;
        let (request_type, rest) = split_u8(rest)?;
        let request_type = RequestType::from_u8(request_type).ok_or_else(|| {
            BitokuError::InvalidInstruction(format!("unknown request type {request_type}"))
        })?;
        let (name, rest) = split_array::<NAME_LEN>(rest)?;
        let (file_id, rest) = split_u8(rest)?;
        let (position, rest) = split_array::<8>(rest)?;
        let (data, _) = split_array::<DATA_LEN>(rest)?;

        Ok(Self {
            client_id,
            request_type,
            name: Name::from_wire(name),
            file_id,
            position: u64::from_le_bytes(position),
            data: Data::from_wire(data),
        })
    }
}

/// A fully typed Bitoku instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BitokuInstruction {
    Initialize,
    CreateClientAccount,
    DeleteClient { client_id: u8 },
    SendRequest(SendRequestArgs),
}

impl BitokuInstruction {
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Initialize => Opcode::Initialize,
            Self::CreateClientAccount => Opcode::CreateClientAccount,
            Self::DeleteClient { .. } => Opcode::DeleteClient,
            Self::SendRequest(_) => Opcode::SendRequest,
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let opcode = self.opcode();
        let mut buf = Vec::with_capacity(opcode.payload_len());
        match self {
            Self::Initialize | Self::CreateClientAccount => buf.push(opcode as u8),
            Self::DeleteClient { client_id } => {
                buf.push(opcode as u8);
                buf.push(*client_id);
            }
            Self::SendRequest(args) => args.write_to(&mut buf),
        }
        debug_assert_eq!(buf.len(), opcode.payload_len());
        buf
    }

    /// Reference decoder; inverts `pack` exactly.
    pub fn unpack(input: &[u8]) -> BitokuResult<Self> {
        let (tag, body) = split_u8(input)?;
        let opcode = Opcode::from_u8(tag)
            .ok_or_else(|| BitokuError::InvalidInstruction(format!("unknown opcode {tag}")))?;
        if input.len() != opcode.payload_len() {
            return Err(BitokuError::InvalidInstruction(format!(
                "{} payload is {} bytes, expected {}",
                opcode.as_str(),
                input.len(),
                opcode.payload_len()
            )));
        }

        Ok(match opcode {
            Opcode::Initialize => Self::Initialize,
            Opcode::CreateClientAccount => Self::CreateClientAccount,
            Opcode::DeleteClient => Self::DeleteClient { client_id: body[0] },
            Opcode::SendRequest => Self::SendRequest(SendRequestArgs::read_from(body)?),
        })
    }
}

fn split_u8(input: &[u8]) -> BitokuResult<(u8, &[u8])> {
    input
        .split_first()
        .map(|(b, rest)| (*b, rest))
        .ok_or_else(|| BitokuError::InvalidInstruction("truncated payload".to_string()))
}

fn split_array<const N: usize>(input: &[u8]) -> BitokuResult<([u8; N], &[u8])> {
    if input.len() < N {
        return Err(BitokuError::InvalidInstruction("truncated payload".to_string()));
    }
    let (head, rest) = input.split_at(N);
    let mut out = [0u8; N];
    out.copy_from_slice(head);
    Ok((out, rest))
}

/// Builds program instructions: payload plus the ordered account list.
#[derive(Debug, Clone, Copy)]
pub struct InstructionEncoder {
    program_id: Pubkey,
}

impl InstructionEncoder {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Encode `ix` on behalf of `caller`, deriving the PDAs it touches.
    pub fn encode(&self, caller: &Pubkey, ix: &BitokuInstruction) -> BitokuResult<Instruction> {
        let accounts = match ix.opcode() {
            Opcode::Initialize => {
                let (bookkeeper, _) = pda::derive_bookkeeper(&self.program_id)?;
                vec![
                    AccountMeta::new(*caller, true),
                    AccountMeta::new(bookkeeper, false),
                    AccountMeta::new_readonly(system_program::id(), false),
                    AccountMeta::new_readonly(sysvar::rent::id(), false),
                ]
            }
            Opcode::CreateClientAccount => {
                let pdas = pda::pdas_for_client(&self.program_id, caller)?;
                vec![
                    AccountMeta::new(*caller, true),
                    AccountMeta::new(pdas.bookkeeper.0, false),
                    AccountMeta::new(pdas.request.0, false),
                    AccountMeta::new_readonly(system_program::id(), false),
                    AccountMeta::new_readonly(sysvar::rent::id(), false),
                ]
            }
            Opcode::DeleteClient => {
                let pdas = pda::pdas_for_client(&self.program_id, caller)?;
                vec![
                    AccountMeta::new(*caller, true),
                    AccountMeta::new(pdas.bookkeeper.0, false),
                    AccountMeta::new(pdas.request.0, false),
                ]
            }
            Opcode::SendRequest => {
                let (request, _) = pda::derive_request(&self.program_id, caller)?;
                vec![
                    AccountMeta::new(*caller, true),
                    AccountMeta::new(request, false),
                ]
            }
        };

        Ok(Instruction {
            program_id: self.program_id,
            accounts,
            data: ix.pack(),
        })
    }
}
