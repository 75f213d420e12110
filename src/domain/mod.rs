pub mod classification;
pub mod new_signup;
pub mod signup;
pub mod signup_name;
pub mod waitlist_email;
