//!
//! 集成测试的通用辅助函数
//!

#![allow(dead_code)]

use seal_prims::{MdType, Padding, RsaContext};

/// 固定的 1024 位测试密钥
pub const RSA_N: &str = "C97908F50A0A132472F59D5718B134EBEE51D9B16A9BD411BF3BD17AA6696A28\
                         C5CB64FC3F967A741229FE7DDEC861FB80A85F9472C0492EAE5C373874A46B0D\
                         B9CA2E498319169AC1538D988C740A06E03EEB7C4889CD0E95B57CD89482661F\
                         472E3F1E8A035D150CAE53CCC0F959EEE33C1B7503F699061D8AB0F13F02DA19";
pub const RSA_E: &str = "010001";
pub const RSA_D: &str = "B85F00E96D4486FC060FEAEAB778035C1CFDDE5FD395C2DE72C8850CDE98FD43\
                         4EAEB13D7DDB7138231F36FB6D12A74807170E50C52A5E4E4FD5A7DB0C33229B\
                         0F48F267C0233F29C7D56447D3F51E295581A156BBD411C8635CB46A6A32FDE4\
                         EDB874C5ABD6C3A89DED5FFBE96D2DC6AA04D0834F47D1FA90258B33DEAE2739";
pub const RSA_P: &str = "E58271381EEFFCDA868C925C095A6F905F0B4F0327E2A078F19603235F890B06\
                         B198E37AA1604A43BB4302467F523C360D1052D527D4614B7B8D1362ACC7F9AF";
pub const RSA_Q: &str = "E0BA296660063D03539055DA0DB1D8012394946BD2662EF284E5FABD84F5C517\
                         987D17F777737FAF3D6F1E29001BFDD1DE3942EABB05B0A9BA9A3D1748A402B7";

/// 由其他实现对固定密钥生成的互操作数据
pub const OAEP_SHA256_MESSAGE: &[u8] = b"oaep interop message";
pub const OAEP_SHA256_CIPHERTEXT: &str = "BC6A9C03CC0FA07A0B4942C120D9E916F826E3762EC800D5DE09E8953293D075\
                                          4AF5A3CF881FB1E20C9E01362F7D6F5FA0D95CF2AB73707D743ECCD5CC13B86E\
                                          0BFA52061C2B28ADC0A98FA617A58C6E303E8D72B29E201735EED2016830610A\
                                          0CE06CCC975A2735457FFCE258220B6E79A9646702F26B42A27AA535F3518D7C";
pub const PSS_SHA256_MESSAGE: &[u8] = b"pss interop message";
pub const PSS_SHA256_SIGNATURE: &str = "3638651706C0892DA98EEE99F5D5E38B819BF3272817CC7702CFD376F27B0940\
                                        EE754247972C85B86959A421093AFAA8646574AF5EA1E9E15DF929F365B6B18C\
                                        C0FA98BEB4AE1B6734A6BF9433BF8CDA5EF37BFD5DA341FFC156FA21AFA7BF38\
                                        BCFDE5315CC8E12A522DDBBF8B2B4BDE8E01DD245463DA3E9B7D3EDA61F05DDA";
/// `"abc"` 的 SHA-256 摘要经 PKCS#1 v1.5 签名
pub const V15_SHA256_ABC_SIGNATURE: &str = "A0948681B9A99281794C62A00ADC22F66BFEE3D53ACEA405ADFCA0070AA2F5D5\
                                            E774971CE0ED4920DB876C4BD4D4485E73BE71B60AD27DFE34A94183E8BCA67F\
                                            15C85FA69A5B4DBF0B13BD3F56EC705144857399D478A4FAE566E89BEE5A1645\
                                            3F04D2EBF210E35BC469BBFD808A3B8DDEE9D0346ACE6AC9E492B7776D543EDD";

// 固定 2048 位密钥，默认测试中覆盖 2048 位模长而不必生成密钥
pub const RSA2048_N: &str = "94D31BA6D31AFC885FF08B78A931782195AF20FD9806498B58875D1F7363AA78\
                             F64C9B29A11149C815BA27BDA7FAD972C250217BE079B04DC4388BDD0738AAB3\
                             0BB6BCCAE5967D3BCB3B157C72B364CE0ACEDB0C0604C14229B2C9BE98E9C21B\
                             70467B741CDEE555EC0FFBB5963A3DADD3EE2168C3C92134F5D3ECDE225532C5\
                             4C36823944AB2F3E6AF2EF450591287D22FE8A30B396E7C767D9BAA04E73295D\
                             C2B959252007731EFC80B07752162C4870C7F4851BF4F459773D9D37B4BAA700\
                             386236E0555A9543B2EB22D792019EE0ED5519F34ABA03E3E94668F153CCC214\
                             EE05CD6D88B6209522D1EDC2828ADD690DD9F42F3E64AB32CF76092F5FC6E465";
pub const RSA2048_D: &str = "10CAFD6CC6975DF57975E816F6687998B88E2957D426A977CAC683708011B7F3\
                             AC3F1AA708E0AD85A145FF23FC6766CFF733198423E1374E9F1C8E53A373F676\
                             FB94641B34EAD538C106EAB6BF2E94EA56F7DE69ADE82D726CC81AD1A1E98698\
                             9803ABFC7F217B994568CC4B4227523C621495BA7F951B652174075F4D5A75BE\
                             F7600F9AC6FD320DCC2BE5EC3BCFF9FAAB3EBD70FF57DA76EBF1E97672B2D59B\
                             4742E5410E1C0B1A86DDB16E4B184854DD4F0ED28577B5C1BCD4195BFD30977D\
                             CD42F439CCBF1AB87FE2C7FA8668D8EBAA4B7ECF9E5AE7A6B9A7EA453B7EBE2A\
                             D6EE5F45B5D6D62CE0E846A80149287C4D2F221600910CA8846D08EB0E66BD25";
pub const RSA2048_P: &str = "D1A0772CCCFD3F8A077F33F090D015BBDD9E2A76FE6541073857DADC58581E34\
                             55F1A08F39309AD3DCE098E8E03AAE9CE078B7A124146D53E7A07F6DEB8A5328\
                             7CA12A0B13B791EA29733AD1264A1EB8ED3FAA5E85E23C3C8758370C1ADADF94\
                             5229BC0FC04B9CA78B84B9A1273A7DAB864DC7BA98BC9A756B0A81374C0B57EB";
pub const RSA2048_Q: &str = "B5BF4EF98BA7AB43DF4A8878B5D427AD2F4F869C4A3AC336E93D12F3F88DC1CD\
                             6A36607C078CC149911872CF55D4DD35F1BA2B13A96CB8F5C142F6F19CB81C3B\
                             8BAD9CD158740E0F77D68E7E0C0DEE278AF72D137709C49EC961A5FFBF78A131\
                             548A0D006A1029725042974D14CA9E35BC0C49147D88501B10CC6A3AA2EB70EF";
pub const RSA2048_MESSAGE: &[u8] = b"fixed 2048-bit key";
pub const RSA2048_V15_SHA256_SIGNATURE: &str = "38697C4D66878FE05EBF54201EF8B4946967729BE27A7A18543C292A4DB13D9F\
                                                A45DD91257BB0038665C1757B620DA3F070A8FA15A274FC8621C0658826EAC7B\
                                                8DA9254701A21E223313F0997DE8330FA8FEE8DBCD1C382621B7B3D63B017E1B\
                                                5EA929EA347D7523F31782C56DCD363A45DADCC1ACBD0EACED5B6A6404818B74\
                                                98A6DB7E2A695C025005840A0961AA4468D5DC9A9858DB41A07EE939D27DAB41\
                                                83232CE8245437F9CFD8EBB53E352507D37EC98373528C286E8505A2A2CA4663\
                                                59BB3E2613397398B684235332407CBB6AA303DAAD74489F5F9EBCD0CA94BEDE\
                                                5F00A6EE39558B4AE043A14E58D0D5D9C73E766D3216002B14F8A1F8169C4F2B";

pub fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap()
}

/// 导入固定密钥的上下文
pub fn fixed_rsa(padding: Padding, hash_id: MdType) -> RsaContext {
    let mut ctx = RsaContext::new(padding, hash_id);
    ctx.import_private(
        &unhex(RSA_N),
        &unhex(RSA_E),
        &unhex(RSA_D),
        &unhex(RSA_P),
        &unhex(RSA_Q),
    )
    .unwrap();
    ctx
}

/// 导入固定 2048 位密钥的上下文
pub fn fixed_rsa2048(padding: Padding, hash_id: MdType) -> RsaContext {
    let mut ctx = RsaContext::new(padding, hash_id);
    ctx.import_private(
        &unhex(RSA2048_N),
        &unhex(RSA_E),
        &unhex(RSA2048_D),
        &unhex(RSA2048_P),
        &unhex(RSA2048_Q),
    )
    .unwrap();
    ctx
}
