/// 业务错误码，写入响应体的 `code` 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    Unauthorized = 1001,
    Forbidden = 1002,
    NotFound = 1003,
    RateLimitExceeded = 1004,
    InternalServerError = 1005,
    Conflict = 1006,

    // 认证与用户
    AuthFailed = 2000,
    UserNotFound = 2001,
    UserAlreadyExists = 2002,
    UserNameInvalid = 2003,
    UserEmailInvalid = 2004,
    UserPasswordInvalid = 2005,
    UserInactive = 2006,
    UserCreationFailed = 2007,
    UserUpdateFailed = 2008,

    // 学生
    StudentNotFound = 3000,
    StudentAlreadyExists = 3001,
    StudentCreationFailed = 3002,
    StudentPhotoInvalid = 3003,

    // 班级与课表
    ClassNotFound = 4000,
    ClassAlreadyExists = 4001,
    ClassPermissionDenied = 4002,
    ClassCreationFailed = 4003,
    ScheduleConflict = 4004,
    ScheduleInvalid = 4005,
    ScheduleCorrupted = 4006,

    // 考试
    ExamNotFound = 5000,
    ExamCreationFailed = 5001,
    ExamClassEmpty = 5002,
    ExamCapacityExceeded = 5003,

    // 考勤
    AttendanceNotFound = 6000,
    AttendanceSubmitFailed = 6001,

    // 反馈
    FeedbackNotFound = 7000,

    // 文件
    FileUploadFailed = 8000,
    FileTypeNotAllowed = 8001,
    FileSizeExceeded = 8002,
    ExportFailed = 8003,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success as i32, 0);
        assert_eq!(ErrorCode::Unauthorized as i32, 1001);
        assert_eq!(ErrorCode::ScheduleConflict as i32, 4004);
        assert_eq!(ErrorCode::ExamClassEmpty as i32, 5002);
    }
}
