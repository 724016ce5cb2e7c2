use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

/// The coarse outcome classes every failure falls into. The HTTP layer
/// picks a status code from this and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidArgument,
    SelfReferenceNotAllowed,
    Internal,
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("you cannot do that to yourself")]
    SelfReferenceNotAllowed,

    // -- Relationships --
    #[error("you are already friends")]
    AlreadyFriends,

    #[error("a request is already pending")]
    DuplicateRequest,

    #[error("they have already sent you a friend request")]
    ReciprocalRequest,

    #[error("no such request")]
    NoSuchRequest,

    #[error("you are not friends")]
    NotFriends,

    // -- Communities --
    #[error("community name is already taken")]
    NameTaken,

    #[error("already a member")]
    AlreadyMember,

    #[error("already invited")]
    DuplicateInvite,

    #[error("no such invite")]
    NoSuchInvite,

    #[error("owners cannot leave their community")]
    OwnerCannotLeave,

    #[error("not a member")]
    NotMember,

    #[error("a community must keep at least one owner")]
    LastOwner,

    #[error("sole owner of {0} community(ies); hand over ownership first")]
    SoleOwner(usize),

    // -- Content --
    #[error("already voted")]
    AlreadyVoted,

    #[error("{0}")]
    Conflict(&'static str),

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) | Self::NoSuchRequest | Self::NoSuchInvite => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::SelfReferenceNotAllowed => ErrorKind::SelfReferenceNotAllowed,
            Self::AlreadyFriends
            | Self::DuplicateRequest
            | Self::ReciprocalRequest
            | Self::NotFriends
            | Self::NameTaken
            | Self::AlreadyMember
            | Self::DuplicateInvite
            | Self::OwnerCannotLeave
            | Self::NotMember
            | Self::LastOwner
            | Self::SoleOwner(_)
            | Self::AlreadyVoted
            | Self::Conflict(_) => ErrorKind::Conflict,
            Self::Storage(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
