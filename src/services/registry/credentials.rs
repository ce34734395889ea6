//! 仓库凭据编码

use base64::{engine::general_purpose::STANDARD, Engine};

/// 将用户名和密码编码为 `base64("username:password")`
///
/// 任一缺失（或为空）时返回 `None`，调用方不应传递凭据变量
pub fn encode_credentials(username: Option<&str>, passwd: Option<&str>) -> Option<String> {
    match (username, passwd) {
        (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
            Some(STANDARD.encode(format!("{}:{}", u, p)))
        }
        _ => None,
    }
}
